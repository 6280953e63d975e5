use serde::Serialize;

use super::platform::Platform;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Page was parsed but title or price is missing.
    NotFound,
    /// Network, timeout or rate limit; worth retrying later.
    TransientError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::TransientError => "transient_error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub title: String,
    /// 0.0 means no price was found.
    pub price: f64,
    /// Absolute URL, or empty when no image validated.
    pub image_url: String,
    pub platform: Platform,
    pub outcome: Outcome,
}

impl ExtractionResult {
    /// Result for a page that could not be fetched at all.
    pub fn unfetched(platform: Platform, outcome: Outcome) -> Self {
        ExtractionResult { title: String::new(), price: 0.0, image_url: String::new(), platform, outcome }
    }

    pub fn is_success(&self) -> bool { self.outcome == Outcome::Success }
}
