use anyhow::{bail, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};

// Parse a window string like "7d", "YYYY-MM-DD", or RFC3339 into a UTC timestamp.
pub fn parse_window_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    // "7d" -> now - 7 days
    if let Some(stripped) = s.strip_suffix('d') {
        if let Ok(days) = stripped.parse::<i64>() {
            if days > 0 {
                return Some(Utc::now() - Duration::days(days));
            }
        }
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = nd.and_hms_opt(0, 0, 0) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

// --since for `product history`
pub fn parse_since_opt(since: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    let Some(s) = since.as_ref() else { return Ok(None) };
    match parse_window_str(s) {
        Some(ts) => Ok(Some(ts)),
        None => bail!("Invalid --since {:?}: expected 7d, YYYY-MM-DD or RFC3339", s),
    }
}
