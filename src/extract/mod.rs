use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::fetch::{self, FetchConfig, HttpFetcher};
use crate::output::types::Meta;
use crate::telemetry::{self};
use crate::telemetry::ops::extract::Phase as ExtractPhase;

mod fields;
mod image;
mod platform;
mod price;
mod profile;
mod types;

pub use fields::extract_with;
pub use platform::Platform;
pub use profile::SiteTable;
pub use types::{ExtractionResult, Outcome};

/// Load the site table once per process (`PRICEWATCH_SITES` or built-in).
pub fn install_site_table() -> Result<()> {
    let table = SiteTable::from_env().context("load site table")?;
    profile::install(table);
    Ok(())
}

pub fn site_table() -> &'static SiteTable { profile::global() }

/// Extract with the process-wide site table.
pub fn extract(url: &str, html: &str, platform: Platform) -> ExtractionResult {
    extract_with(site_table(), url, html, platform)
}

/// pricewatch extract <url>
#[derive(Args)]
pub struct ExtractCmd {
    pub url: String,
    /// Parse a saved page instead of fetching `url`.
    #[arg(long)] pub html_file: Option<PathBuf>,
    /// Force a platform profile instead of detecting it from the URL.
    #[arg(long, value_enum, ignore_case = true)] pub platform: Option<Platform>,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    url: &'a str,
    source: &'static str,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

pub async fn run(args: ExtractCmd) -> Result<()> {
    let log = telemetry::extract();
    let started = Instant::now();
    let _g = log.root_span_kv([
        ("url", args.url.clone()),
        ("html_file", format!("{:?}", args.html_file)),
        ("platform", format!("{:?}", args.platform)),
    ]).entered();

    let platform = args.platform.unwrap_or_else(|| Platform::detect(&args.url));

    let (html, source, attempts, fetch_outcome) = match &args.html_file {
        Some(path) => {
            let _s = log.span(&ExtractPhase::ReadFile).entered();
            let html = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            (Some(html), "file", 0, Outcome::Success)
        }
        None => {
            let _s = log.span_kv(&ExtractPhase::Fetch, [("url", args.url.clone())]).entered();
            let cfg = FetchConfig::from_env();
            let fetcher = HttpFetcher::new(cfg.timeout).context("build http client")?;
            let fetched = fetch::fetch_with_retry(&fetcher, &cfg, &args.url).await;
            (fetched.html, "network", fetched.attempts, fetched.outcome)
        }
    };

    let result = match html {
        Some(html) => {
            let _s = log.span(&ExtractPhase::Parse).entered();
            extract(&args.url, &html, platform)
        }
        None => ExtractionResult::unfetched(platform, fetch_outcome),
    };

    match result.outcome {
        Outcome::Success => log.info(format!("✅ [{}] {} — {:.2} image={}", result.platform, result.title, result.price, if result.image_url.is_empty() { "-" } else { &result.image_url })),
        Outcome::NotFound => log.warn_kv("🔍 fields missing", [("title", result.title.clone()), ("price", result.price.to_string())]),
        Outcome::TransientError => log.warn_kv("⏳ fetch failed, retry later", [("attempts", attempts.to_string())]),
    }

    if telemetry::config::json_mode() {
        let out = ExtractOutput { url: &args.url, source, result: &result };
        let meta = Meta::elapsed(started);
        log.result_meta(&out, if attempts > 0 { meta.with_attempts(attempts) } else { meta })?;
    }
    Ok(())
}
