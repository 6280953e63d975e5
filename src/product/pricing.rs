use serde::Serialize;

/// Percent change from `prev` to `new`, rounded to 2 places. 0 when there is no previous price.
pub fn price_change_pct(prev: f64, new: f64) -> f64 {
    if prev <= 0.0 { return 0.0; }
    (((new - prev) / prev) * 100.0 * 100.0).round() / 100.0
}

/// Running lowest/highest observed price. Zero means "not seen yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PriceBounds {
    pub lowest: f64,
    pub highest: f64,
}

impl PriceBounds {
    pub fn update(self, price: f64) -> PriceBounds {
        if price <= 0.0 { return self; }
        PriceBounds {
            lowest: if self.lowest <= 0.0 || price < self.lowest { price } else { self.lowest },
            highest: self.highest.max(price),
        }
    }
}

/// lowest / highest / average over a set of history prices.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HistoryStats {
    pub count: usize,
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
}

pub fn history_stats(prices: &[f64]) -> Option<HistoryStats> {
    let valid: Vec<f64> = prices.iter().copied().filter(|p| *p > 0.0).collect();
    if valid.is_empty() { return None; }
    let bounds = valid.iter().fold(PriceBounds::default(), |b, p| b.update(*p));
    let average = valid.iter().sum::<f64>() / valid.len() as f64;
    Some(HistoryStats { count: valid.len(), lowest: bounds.lowest, highest: bounds.highest, average: (average * 100.0).round() / 100.0 })
}

/// Failure counter and availability after one more failed check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FailureStreak {
    pub failures: i32,
    pub is_available: bool,
    /// True only on the check that crossed the threshold.
    pub marked_unavailable: bool,
}

/// A product goes unavailable once `failures` reaches `threshold` (at least 1).
/// A successful check resets the counter to 0 in `record_success`.
pub fn after_failure(failures: i32, was_available: bool, threshold: i32) -> FailureStreak {
    let failures = failures.max(0).saturating_add(1);
    let is_available = was_available && failures < threshold.max(1);
    FailureStreak { failures, is_available, marked_unavailable: was_available && !is_available }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_pct_rounds_and_handles_first_price() {
        assert_eq!(price_change_pct(0.0, 99.0), 0.0);
        assert_eq!(price_change_pct(200.0, 150.0), -25.0);
        assert_eq!(price_change_pct(3.0, 4.0), 33.33);
    }

    #[test]
    fn bounds_track_first_positive_price() {
        let b = PriceBounds::default().update(120.0);
        assert_eq!(b, PriceBounds { lowest: 120.0, highest: 120.0 });
        let b = b.update(99.0).update(130.0).update(0.0);
        assert_eq!(b, PriceBounds { lowest: 99.0, highest: 130.0 });
    }

    #[test]
    fn stats_ignore_zero_rows() {
        assert_eq!(history_stats(&[]), None);
        assert_eq!(history_stats(&[0.0]), None);
        let s = history_stats(&[10.0, 0.0, 20.0, 15.0]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.lowest, 10.0);
        assert_eq!(s.highest, 20.0);
        assert_eq!(s.average, 15.0);
    }

    #[test]
    fn threshold_of_one_marks_on_first_failure() {
        let s = after_failure(0, true, 1);
        assert_eq!(s, FailureStreak { failures: 1, is_available: false, marked_unavailable: true });
        assert!(after_failure(0, true, 0).marked_unavailable);
    }

    #[test]
    fn streak_crosses_threshold_once() {
        let k = 3;
        // k-1 failures: still tracked
        let s = after_failure(k - 2, true, k);
        assert_eq!(s, FailureStreak { failures: k - 1, is_available: true, marked_unavailable: false });
        // k-th failure flips it
        let s = after_failure(s.failures, s.is_available, k);
        assert_eq!(s, FailureStreak { failures: k, is_available: false, marked_unavailable: true });
        // k+1: already unavailable, not counted again
        let s = after_failure(s.failures, s.is_available, k);
        assert_eq!(s, FailureStreak { failures: k + 1, is_available: false, marked_unavailable: false });
    }

    #[test]
    fn first_failure_starts_streak() {
        let s = after_failure(0, true, 3);
        assert_eq!(s.failures, 1);
        assert!(s.is_available);
    }
}
