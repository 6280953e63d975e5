use std::time::Duration;

/// Randomised pause between two product checks in one round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms { (min_ms, max_ms) } else { (max_ms, min_ms) };
        Pacing { min: Duration::from_millis(lo), max: Duration::from_millis(hi) }
    }

    /// Delay before the `index`-th product of a round; the first goes immediately.
    pub fn delay_before(&self, index: usize) -> Duration {
        if index == 0 { return Duration::ZERO; }
        self.next_delay()
    }

    /// Pause between rounds: `interval`, but never shorter than one pacing delay.
    pub fn between_rounds(&self, interval: Duration) -> Duration {
        if interval >= self.min { return interval; }
        self.next_delay().max(interval)
    }

    pub fn next_delay(&self) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if lo >= hi { return self.min; }
        Duration::from_millis(rand::random_range(lo..=hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_product_is_not_delayed() {
        let p = Pacing::from_millis(500, 1500);
        assert_eq!(p.delay_before(0), Duration::ZERO);
    }

    #[test]
    fn delays_stay_within_bounds() {
        let p = Pacing::from_millis(500, 1500);
        for i in 1..200 {
            let d = p.delay_before(i);
            assert!(d >= p.min && d <= p.max, "{:?}", d);
        }
    }

    #[test]
    fn swapped_or_equal_bounds() {
        let p = Pacing::from_millis(900, 100);
        assert_eq!(p.min, Duration::from_millis(100));
        assert_eq!(p.max, Duration::from_millis(900));
        let fixed = Pacing::from_millis(250, 250);
        assert_eq!(fixed.next_delay(), Duration::from_millis(250));
    }

    #[test]
    fn short_interval_still_paces_between_rounds() {
        let p = Pacing::from_millis(500, 1500);
        for _ in 0..50 {
            let d = p.between_rounds(Duration::ZERO);
            assert!(d >= p.min && d <= p.max, "{:?}", d);
        }
        assert_eq!(p.between_rounds(Duration::from_secs(60)), Duration::from_secs(60));
    }
}
