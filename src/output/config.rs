use std::env;

use crate::telemetry::config::json_mode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `PRICEWATCH_OUTPUT_FORMAT` wins; otherwise `--json` selects JSON.
    pub fn from_env() -> Self {
        let format = match env::var("PRICEWATCH_OUTPUT_FORMAT").ok().as_deref() {
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ if json_mode() => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
        let pretty = match env::var("PRICEWATCH_OUTPUT_PRETTY").ok().as_deref() {
            Some(v) => is_truthy(v),
            None => false,
        };
        OutputConfig { format, pretty }
    }
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}
