use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;
use url::Url;

use crate::extract::{self, Outcome};
use crate::fetch::{self, FetchConfig, HttpFetcher};
use crate::telemetry::{self};
use crate::telemetry::ops::product::Phase as ProductPhase;
use crate::util::time::parse_since_opt;

pub(crate) mod db;
pub mod pricing;
pub mod types;

/// pricewatch product add/ls/rm/history/alert
#[derive(Args)]
pub struct ProductCmd {
    #[command(subcommand)]
    pub cmd: ProductSub,
}

#[derive(Subcommand)]
pub enum ProductSub {
    /// Fetch a product page and start tracking it (plan-only by default; use --apply to write)
    Add {
        url: String,
        /// Also register a price alert at this target.
        #[arg(long)]
        target_price: Option<f64>,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    /// List tracked products
    Ls {
        /// Filter by availability: true/false. Omit to show all.
        #[arg(long)]
        available: Option<bool>,
    },
    /// Stop tracking a product (history and alerts go with it)
    Rm {
        product_id: i64,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    /// Show price history with lowest/highest/average
    History {
        product_id: i64,
        /// "7d", "YYYY-MM-DD" or RFC3339
        #[arg(long)]
        since: Option<String>,
        #[arg(long, default_value_t = 30)]
        limit: i64,
    },
    /// Register a price alert
    Alert {
        product_id: i64,
        target_price: f64,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
}

pub async fn run(pool: &PgPool, args: ProductCmd) -> Result<()> {
    let log = telemetry::product();
    let _g = log.root_span().entered();
    match args.cmd {
        ProductSub::Add { url, target_price, apply } => add_product(pool, url, target_price, apply).await?,
        ProductSub::Ls { available } => ls_products(pool, available).await?,
        ProductSub::Rm { product_id, apply } => rm_product(pool, product_id, apply).await?,
        ProductSub::History { product_id, since, limit } => show_history(pool, product_id, since, limit).await?,
        ProductSub::Alert { product_id, target_price, apply } => add_alert(pool, product_id, target_price, apply).await?,
    }
    Ok(())
}

async fn add_product(pool: &PgPool, url: String, target_price: Option<f64>, apply: bool) -> Result<()> {
    let log = telemetry::product();
    let started = Instant::now();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("url", url.clone()),
        ("target_price", format!("{:?}", target_price)),
    ]).entered();

    // URL validation (friendly error before network I/O)
    if Url::parse(&url).is_err() { bail!("Invalid URL: {}", url); }
    if let Some(t) = target_price { if t <= 0.0 { bail!("--target-price must be positive, got {}", t); } }

    let result = {
        let _s = log.span_kv(&ProductPhase::Fetch, [("url", url.clone())]).entered();
        let cfg = FetchConfig::from_env();
        let fetcher = HttpFetcher::new(cfg.timeout).context("build http client")?;
        fetch::fetch_and_extract(&fetcher, &cfg, extract::site_table(), &url).await
    };
    let would_store = result.outcome == Outcome::Success;

    if !apply {
        let _s = log.span(&ProductPhase::Plan).entered();
        log.info(format!(
            "📝 Product plan — add url={} platform={} title={:?} price={:.2} outcome={}",
            url, result.platform, result.title, result.price, result.outcome.as_str()
        ));
        if !would_store { log.info("   Nothing would be stored: title and price are both required."); }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::ProductAddPlan { action: "add", url: &url, target_price, would_store, extracted: &result };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    if !would_store {
        bail!("could not read product at {} ({}); nothing stored", url, result.outcome.as_str());
    }

    let _s = log.span(&ProductPhase::Add).entered();
    let (product_id, inserted) = db::upsert_product(pool, &url, &result).await?;
    let update = db::record_success(pool, product_id, &result).await?;
    let alert_id = match target_price {
        Some(t) => Some(db::insert_alert(pool, product_id, t).await?),
        None => None,
    };

    if inserted { log.info(format!("➕ Product {} added — {} at {:.2}", product_id, result.title, update.current)); }
    else { log.info(format!("♻️ Product {} updated — {} at {:.2} ({:+.2}%)", product_id, result.title, update.current, update.change_pct)); }

    if telemetry::config::json_mode() {
        let res = types::ProductAddResult { product_id, inserted, update, alert_id };
        log.result_timed(&res, started)?;
    }
    Ok(())
}

async fn ls_products(pool: &PgPool, available: Option<bool>) -> Result<()> {
    let log = telemetry::product();
    let _g = log.root_span_kv([("available", format!("{:?}", available))]).entered();
    let _s = log.span(&ProductPhase::List).entered();
    let products = db::list_products(pool, available).await?;
    log.info("🛒 Products:");
    for p in &products {
        log.info(format!(
            "[{}] {} ({}) price={:.2} low={:.2} high={:.2} change={:+.2}% available={} last_checked={}",
            p.product_id, p.name, p.platform, p.current_price, p.lowest_price, p.highest_price,
            p.price_change_pct, p.is_available, p.last_checked
        ));
    }
    if telemetry::config::json_mode() {
        let list = types::ProductList { products };
        log.result(&list)?;
    }
    Ok(())
}

async fn rm_product(pool: &PgPool, product_id: i64, apply: bool) -> Result<()> {
    let log = telemetry::product();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("product_id", product_id.to_string()),
    ]).entered();

    let Some(product) = db::get_product(pool, product_id).await? else {
        bail!("No product with id {}", product_id);
    };

    if !apply {
        let _s = log.span(&ProductPhase::Plan).entered();
        log.info(format!("📝 Product plan — remove [{}] {} ({})", product.product_id, product.name, product.url));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::ProductRemovePlan { action: "remove", product };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let _s = log.span(&ProductPhase::Remove).entered();
    let deleted = db::delete_product(pool, product_id).await?;
    if deleted { log.info(format!("🗑️ Product {} removed", product_id)); }
    if telemetry::config::json_mode() {
        log.result(&types::ProductRemoveResult { product_id, deleted })?;
    }
    Ok(())
}

async fn show_history(pool: &PgPool, product_id: i64, since: Option<String>, limit: i64) -> Result<()> {
    let log = telemetry::product();
    let _g = log.root_span_kv([
        ("product_id", product_id.to_string()),
        ("since", format!("{:?}", since)),
        ("limit", limit.to_string()),
    ]).entered();
    let _s = log.span(&ProductPhase::History).entered();

    let Some(product) = db::get_product(pool, product_id).await? else {
        bail!("No product with id {}", product_id);
    };
    let since_ts = parse_since_opt(&since)?;
    let history = db::history(pool, product_id, since_ts, limit.max(1)).await?;
    let prices: Vec<f64> = history.iter().map(|h| h.price).collect();
    let stats = pricing::history_stats(&prices);

    log.info(format!("📈 [{}] {} — {} point(s)", product.product_id, product.name, history.len()));
    if let Some(s) = &stats {
        log.info(format!("   low={:.2} high={:.2} avg={:.2}", s.lowest, s.highest, s.average));
    }
    for h in &history {
        log.info(format!("   {}  {:.2}", h.recorded_at, h.price));
    }

    if telemetry::config::json_mode() {
        log.result(&types::ProductHistory { product, stats, history })?;
    }
    Ok(())
}

async fn add_alert(pool: &PgPool, product_id: i64, target_price: f64, apply: bool) -> Result<()> {
    let log = telemetry::product();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("product_id", product_id.to_string()),
        ("target_price", target_price.to_string()),
    ]).entered();

    if target_price <= 0.0 { bail!("target price must be positive, got {}", target_price); }
    let Some(product) = db::get_product(pool, product_id).await? else {
        bail!("No product with id {}", product_id);
    };

    if !apply {
        let _s = log.span(&ProductPhase::Plan).entered();
        log.info(format!("📝 Alert plan — [{}] {} when price <= {:.2} (now {:.2})", product_id, product.name, target_price, product.current_price));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::AlertPlan { action: "alert", product_id, target_price, current_price: product.current_price };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let _s = log.span(&ProductPhase::Alert).entered();
    let alert_id = db::insert_alert(pool, product_id, target_price).await?;
    log.info(format!("🔔 Alert {} set for product {} at {:.2}", alert_id, product_id, target_price));
    if telemetry::config::json_mode() {
        log.result(&types::AlertResult { alert_id, product_id, target_price })?;
    }
    Ok(())
}
