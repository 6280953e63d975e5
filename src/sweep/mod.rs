use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;

use crate::extract;
use crate::fetch::{self, FetchConfig, HttpFetcher, PageFetcher};
use crate::product;
use crate::product::types::ProductRow;
use crate::telemetry::{self};
use crate::telemetry::ops::sweep::Phase as SweepPhase;

mod db;
mod pacing;
pub mod types;

use pacing::Pacing;
use types::{Checked, RoundSummary};

/// pricewatch sweep: re-check tracked products in paced rounds
#[derive(Args)]
pub struct SweepCmd {
    /// Run a single round and exit.
    #[arg(long, default_value_t = false)]
    pub once: bool,
    /// Products checked per round (oldest `last_checked` first).
    #[arg(long, default_value_t = 20)]
    pub batch_size: i64,
    /// Pause between rounds.
    #[arg(long, default_value_t = 3600)]
    pub interval_secs: u64,
    #[arg(long, default_value_t = 1000)]
    pub min_delay_ms: u64,
    #[arg(long, default_value_t = 3000)]
    pub max_delay_ms: u64,
    /// Consecutive failed checks before a product is marked unavailable.
    #[arg(long, default_value_t = 3)]
    pub failure_threshold: i32,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

pub async fn run(pool: &PgPool, args: SweepCmd) -> Result<()> {
    let log = telemetry::sweep();
    let _g = log.root_span_kv([
        ("mode", if args.apply { "apply".to_string() } else { "plan".to_string() }),
        ("once", args.once.to_string()),
        ("batch_size", args.batch_size.to_string()),
        ("interval_secs", args.interval_secs.to_string()),
        ("failure_threshold", args.failure_threshold.to_string()),
    ]).entered();

    let batch_size = args.batch_size.max(1);
    let failure_threshold = args.failure_threshold.max(1);

    if !args.apply {
        let _s = log.span(&SweepPhase::Plan).entered();
        let due = product::db::select_due(pool, batch_size).await?;
        log.info(format!("📝 Sweep plan — would check {} product(s), {}ms..{}ms apart", due.len(), args.min_delay_ms, args.max_delay_ms));
        for p in &due {
            log.info(format!("   [{}] {} last_checked={}", p.product_id, p.url, p.last_checked));
        }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::SweepPlan { action: "sweep", batch_size, failure_threshold, products: due };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let cfg = FetchConfig::from_env();
    let fetcher = HttpFetcher::new(cfg.timeout).context("build http client")?;
    let pacing = Pacing::from_millis(args.min_delay_ms, args.max_delay_ms);

    let mut round = 0u64;
    loop {
        round += 1;
        let started = Instant::now();
        match sweep_round(pool, &fetcher, &cfg, &pacing, batch_size, failure_threshold, round).await {
            Ok(summary) => {
                log.round_summary(summary.round, summary.checked, summary.updated, summary.failed, summary.marked_unavailable, summary.alerts);
                if telemetry::config::json_mode() { log.result_timed(&summary, started)?; }
            }
            Err(e) if args.once => return Err(e),
            Err(e) => log.warn_kv("⚠️ sweep round failed", [("round", round.to_string()), ("error", format!("{:#}", e))]),
        }

        if args.once { break; }
        let pause = pacing.between_rounds(Duration::from_secs(args.interval_secs));
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = tokio::signal::ctrl_c() => {
                log.info("🛑 Sweep interrupted");
                break;
            }
        }
    }
    Ok(())
}

async fn sweep_round(
    pool: &PgPool,
    fetcher: &dyn PageFetcher,
    cfg: &FetchConfig,
    pacing: &Pacing,
    batch_size: i64,
    failure_threshold: i32,
    round: u64,
) -> Result<RoundSummary> {
    let log = telemetry::sweep();
    let _g = log.span_kv(&SweepPhase::Round, [("round", round.to_string())]).entered();

    let due = {
        let _s = log.span(&SweepPhase::SelectDue).entered();
        product::db::select_due(pool, batch_size).await?
    };
    let mut summary = RoundSummary::new(round);

    for (i, p) in due.iter().enumerate() {
        let delay = pacing.delay_before(i);
        if !delay.is_zero() {
            let _s = log.span(&SweepPhase::Pace).entered();
            tokio::time::sleep(delay).await;
        }
        let res = check_product(pool, fetcher, cfg, p, failure_threshold).await;
        if let Some(e) = summary.add_result(res) {
            log.warn_kv(
                &format!("⚠️ [{}] check errored", p.product_id),
                [("url", p.url.clone()), ("error", format!("{:#}", e))],
            );
        }
    }
    Ok(summary)
}

async fn check_product(pool: &PgPool, fetcher: &dyn PageFetcher, cfg: &FetchConfig, p: &ProductRow, failure_threshold: i32) -> Result<Checked> {
    let log = telemetry::sweep();
    let result = {
        let _s = log.span_kv(&SweepPhase::Check, [("product_id", p.product_id.to_string()), ("url", p.url.clone())]).entered();
        fetch::fetch_and_extract(fetcher, cfg, extract::site_table(), &p.url).await
    };

    let _s = log.span(&SweepPhase::Record).entered();
    if !result.is_success() {
        let streak = db::record_failure(pool, p.product_id, failure_threshold).await?;
        log.warn_kv(
            &format!("⚠️ [{}] check failed ({})", p.product_id, result.outcome.as_str()),
            [("consecutive_failures", streak.failures.to_string()), ("is_available", streak.is_available.to_string())],
        );
        if streak.marked_unavailable {
            log.warn(format!("🚫 [{}] {} marked unavailable after {} failed checks", p.product_id, p.name, streak.failures));
        }
        return Ok(Checked::Failed { marked_unavailable: streak.marked_unavailable });
    }

    let update = product::db::record_success(pool, p.product_id, &result).await?;
    log.info_kv(
        &format!("💰 [{}] {} — {:.2} ({:+.2}%)", p.product_id, p.name, update.current, update.change_pct),
        [("previous", update.previous.to_string()), ("lowest", update.lowest.to_string()), ("highest", update.highest.to_string())],
    );

    let _a = log.span(&SweepPhase::Alerts).entered();
    let alerts = db::triggered_alerts(pool, p.product_id, update.current).await?;
    for a in &alerts {
        log.info_kv(
            &format!("🔔 [{}] {} is at {:.2}, at or below target {:.2}", p.product_id, p.name, update.current, a.target_price),
            [("alert_id", a.alert_id.to_string())],
        );
    }
    Ok(Checked::Updated { alerts: alerts.len() })
}
