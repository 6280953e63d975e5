use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

mod extract;
mod fetch;
mod init;
mod output;
mod product;
mod sweep;
mod telemetry;
mod util;

use telemetry::ops::init::Phase as InitPhase;

#[derive(Parser)]
#[command(name = "pricewatch", about = "E-commerce price tracking CLI")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init(init::InitCmd),
    /// Fetch (or read) one product page and print what the extractor finds
    Extract(extract::ExtractCmd),
    Product(product::ProductCmd),
    Sweep(sweep::SweepCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and PRICEWATCH_LOG_FORMAT
    telemetry::config::init_tracing();
    extract::install_site_table()?;

    match cli.command {
        Commands::Extract(args) => extract::run(args).await?,
        Commands::Init(args) => init::run(&connect(cli.dsn).await?, args).await?,
        Commands::Product(args) => product::run(&connect(cli.dsn).await?, args).await?,
        Commands::Sweep(args) => sweep::run(&connect(cli.dsn).await?, args).await?,
    }

    Ok(())
}

async fn connect(dsn: Option<String>) -> Result<PgPool> {
    let log = telemetry::init();
    let _s = log.span(&InitPhase::Connect).entered();
    let dsn = dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("Please provide --dsn or set DATABASE_URL in .env")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .context("connect to postgres")?;
    Ok(pool)
}
