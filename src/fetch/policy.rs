use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 2_000;
const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 10;

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0 Safari/537.36",
];

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Back-off unit: attempt n waits `n * retry_base` plus up to one more unit of jitter.
    pub retry_base: Duration,
    /// HTTP 429 waits `n * rate_limit_cooldown`.
    pub rate_limit_cooldown: Duration,
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            rate_limit_cooldown: Duration::from_secs(DEFAULT_RATE_LIMIT_COOLDOWN_SECS),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("PRICEWATCH_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed.max(1));
            }
        }
        if let Ok(v) = std::env::var("PRICEWATCH_MAX_ATTEMPTS") {
            if let Ok(parsed) = v.parse::<u32>() {
                cfg.max_attempts = parsed.max(1);
            }
        }
        if let Ok(v) = std::env::var("PRICEWATCH_RETRY_BASE_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.retry_base = Duration::from_millis(parsed);
            }
        }
        if let Ok(v) = std::env::var("PRICEWATCH_RATE_LIMIT_COOLDOWN_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.rate_limit_cooldown = Duration::from_secs(parsed);
            }
        }
        if let Ok(v) = std::env::var("PRICEWATCH_USER_AGENTS") {
            let agents: Vec<String> = v.split('|').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
            if !agents.is_empty() {
                cfg.user_agents = agents;
            }
        }
        cfg
    }

    /// Delay after a failed attempt `attempt` (1-based). Lies in
    /// `[attempt * base, (attempt + 1) * base)`, so it grows strictly with the attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_base.as_millis() as u64;
        let jitter_ms = if base_ms == 0 { 0 } else { rand::random_range(0..base_ms) };
        Duration::from_millis(base_ms * attempt as u64 + jitter_ms)
    }

    pub fn cooldown(&self, attempt: u32) -> Duration {
        self.rate_limit_cooldown * attempt
    }

    /// Rotates through the configured agents, one per attempt.
    pub fn user_agent(&self, attempt: u32) -> &str {
        if self.user_agents.is_empty() { return DEFAULT_USER_AGENTS[0]; }
        let idx = (attempt.saturating_sub(1) as usize) % self.user_agents.len();
        &self.user_agents[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_strictly() {
        let cfg = FetchConfig::default();
        for _ in 0..50 {
            let d1 = cfg.backoff(1);
            let d2 = cfg.backoff(2);
            let d3 = cfg.backoff(3);
            assert!(d1 < d2 && d2 < d3, "{d1:?} {d2:?} {d3:?}");
            assert!(d1 >= cfg.retry_base && d1 < cfg.retry_base * 2);
        }
    }

    #[test]
    fn zero_base_means_no_wait() {
        let cfg = FetchConfig { retry_base: Duration::ZERO, ..FetchConfig::default() };
        assert_eq!(cfg.backoff(3), Duration::ZERO);
    }

    #[test]
    fn cooldown_scales_with_attempt() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.cooldown(1), Duration::from_secs(10));
        assert_eq!(cfg.cooldown(3), Duration::from_secs(30));
    }

    #[test]
    fn user_agent_rotates() {
        let cfg = FetchConfig { user_agents: vec!["a".into(), "b".into()], ..FetchConfig::default() };
        assert_eq!(cfg.user_agent(1), "a");
        assert_eq!(cfg.user_agent(2), "b");
        assert_eq!(cfg.user_agent(3), "a");
        let empty = FetchConfig { user_agents: vec![], ..FetchConfig::default() };
        assert!(empty.user_agent(1).starts_with("Mozilla"));
    }
}
