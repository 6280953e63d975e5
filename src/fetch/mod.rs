use std::time::Duration;

use tracing::{debug, warn};

use crate::extract::{self, ExtractionResult, Outcome, Platform, SiteTable};

mod client;
mod policy;

pub use client::{FetchError, HttpFetcher, PageFetcher};
pub use policy::FetchConfig;

#[cfg(test)]
pub(crate) use client::mock::MockFetcher;

/// What a bounded fetch produced. `html` is only set on `Success`.
#[derive(Debug)]
pub struct Fetched {
    pub html: Option<String>,
    pub outcome: Outcome,
    pub attempts: u32,
    /// Pauses taken between attempts, in order.
    pub waits: Vec<Duration>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
}

/// GET `url`, retrying timeouts, connection errors, 5xx/408 and 429 up to
/// `cfg.max_attempts`. Other 4xx and unbuildable URLs are permanent and
/// reported as `NotFound`.
pub async fn fetch_with_retry(fetcher: &dyn PageFetcher, cfg: &FetchConfig, url: &str) -> Fetched {
    let max_attempts = cfg.max_attempts.max(1);
    let mut waits = Vec::new();
    let mut last_status = None;
    let mut last_error = None;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let user_agent = cfg.user_agent(attempt);
        debug!(url, attempt, "fetch");

        let wait = match fetcher.get(url, user_agent).await {
            Ok(resp) if (200..300).contains(&resp.status) => {
                return Fetched { html: Some(resp.body), outcome: Outcome::Success, attempts: attempt, waits, last_status: Some(resp.status), last_error };
            }
            Ok(resp) if resp.status == 429 => {
                last_status = Some(resp.status);
                let wait = cfg.cooldown(attempt);
                warn!(url, attempt, wait_ms = wait.as_millis() as u64, "rate limited");
                wait
            }
            Ok(resp) if resp.status == 408 || resp.status >= 500 => {
                last_status = Some(resp.status);
                warn!(url, attempt, status = resp.status, "server error");
                cfg.backoff(attempt)
            }
            Ok(resp) => {
                warn!(url, status = resp.status, "permanent http status");
                return Fetched { html: None, outcome: Outcome::NotFound, attempts: attempt, waits, last_status: Some(resp.status), last_error };
            }
            Err(err @ FetchError::InvalidUrl(_)) => {
                warn!(url, error = %err, "permanent fetch error");
                return Fetched { html: None, outcome: Outcome::NotFound, attempts: attempt, waits, last_status, last_error: Some(err.to_string()) };
            }
            Err(err) => {
                warn!(url, attempt, error = %err, "fetch failed");
                last_error = Some(err.to_string());
                cfg.backoff(attempt)
            }
        };

        if attempt >= max_attempts { break; }
        waits.push(wait);
        tokio::time::sleep(wait).await;
    }

    Fetched { html: None, outcome: Outcome::TransientError, attempts: attempt, waits, last_status, last_error }
}

/// Fetch with retry, then run the extractor on the page.
pub async fn fetch_and_extract(fetcher: &dyn PageFetcher, cfg: &FetchConfig, table: &SiteTable, url: &str) -> ExtractionResult {
    let platform = Platform::detect(url);
    let fetched = fetch_with_retry(fetcher, cfg, url).await;
    match fetched.html {
        Some(html) => extract::extract_with(table, url, &html, platform),
        None => ExtractionResult::unfetched(platform, fetched.outcome),
    }
}
