use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

/// pricewatch init: create the `pricewatch` schema
#[derive(Args)]
pub struct InitCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

#[derive(Serialize)]
struct InitPlan { action: &'static str, migrations: Vec<String> }

#[derive(Serialize)]
struct InitResult { applied: bool, migrations: usize }

pub async fn run(pool: &PgPool, args: InitCmd) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span_kv([("mode", if args.apply { "apply".to_string() } else { "plan".to_string() })]).entered();

    let migrator = sqlx::migrate!();
    let names: Vec<String> = migrator.iter().map(|m| format!("{} {}", m.version, m.description)).collect();

    if !args.apply {
        let _s = log.span(&InitPhase::Plan).entered();
        log.info(format!("📝 Init plan — {} migration(s) would be applied if pending", names.len()));
        for n in &names { log.info(format!("   {}", n)); }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&InitPlan { action: "init", migrations: names })?;
        }
        return Ok(());
    }

    let _s = log.span(&InitPhase::Migrate).entered();
    // Idempotent: already-applied versions are skipped.
    migrator.run(pool).await.context("run migrations")?;
    log.info("✅ Database initialized");
    if telemetry::config::json_mode() {
        log.result(&InitResult { applied: true, migrations: names.len() })?;
    }
    Ok(())
}
