use std::sync::OnceLock;

use regex::Regex;

fn first_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.?\d*").expect("static price regex"))
}

/// Turn a price snippet like `"¥1,234.56"` into a number.
///
/// Everything except digits and `.` is dropped (commas are thousands
/// separators). If the remainder does not parse, the first decimal-looking
/// run in the original text is tried instead. Returns `None` for empty,
/// non-numeric or non-positive input.
pub fn normalize_price(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    let parsed = cleaned.parse::<f64>().ok().or_else(|| {
        let m = first_number().find(text)?;
        m.as_str().parse::<f64>().ok()
    })?;

    positive(parsed)
}

/// Parse a machine-readable price (meta `content`, regex capture) without cleanup.
pub fn parse_plain(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().and_then(positive)
}

fn positive(v: f64) -> Option<f64> {
    if v.is_finite() && v > 0.0 { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_and_separators() {
        assert_eq!(normalize_price("¥1,234.56"), Some(1234.56));
        assert_eq!(normalize_price("1234.56"), Some(1234.56));
        assert_eq!(normalize_price("￥ 999"), Some(999.0));
        assert_eq!(normalize_price("  ¥ 59.90 起 "), Some(59.9));
    }

    #[test]
    fn malformed_is_not_found() {
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("free"), None);
        assert_eq!(normalize_price("¥"), None);
        assert_eq!(normalize_price("¥0.00"), None);
    }

    #[test]
    fn several_dots_fall_back_to_first_run() {
        // "1.2.3" does not parse after cleanup; the first decimal run wins
        assert_eq!(normalize_price("v1.2.3"), Some(1.2));
    }

    #[test]
    fn plain_parse_rejects_zero_and_text() {
        assert_eq!(parse_plain(" 88.00 "), Some(88.0));
        assert_eq!(parse_plain("0"), None);
        assert_eq!(parse_plain("n/a"), None);
    }
}
