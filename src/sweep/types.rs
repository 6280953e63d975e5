use anyhow::Error;
use serde::Serialize;

use crate::product::types::ProductRow;

#[derive(Serialize)]
pub struct SweepPlan {
    pub action: &'static str,
    pub batch_size: i64,
    pub failure_threshold: i32,
    pub products: Vec<ProductRow>,
}

/// How one product check ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Checked {
    Updated { alerts: usize },
    Failed { marked_unavailable: bool },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u64,
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
    pub marked_unavailable: usize,
    pub alerts: usize,
}

impl RoundSummary {
    pub fn new(round: u64) -> Self { RoundSummary { round, ..Default::default() } }

    pub fn add(&mut self, c: Checked) {
        self.checked += 1;
        match c {
            Checked::Updated { alerts } => { self.updated += 1; self.alerts += alerts; }
            Checked::Failed { marked_unavailable } => {
                self.failed += 1;
                if marked_unavailable { self.marked_unavailable += 1; }
            }
        }
    }

    /// Errored checks are tallied as failed; the error is handed back for logging.
    pub fn add_result(&mut self, res: Result<Checked, Error>) -> Option<Error> {
        match res {
            Ok(c) => { self.add(c); None }
            Err(e) => { self.add(Checked::Failed { marked_unavailable: false }); Some(e) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_kind() {
        let mut s = RoundSummary::new(4);
        s.add(Checked::Updated { alerts: 0 });
        s.add(Checked::Updated { alerts: 2 });
        s.add(Checked::Failed { marked_unavailable: false });
        s.add(Checked::Failed { marked_unavailable: true });
        assert_eq!(s, RoundSummary { round: 4, checked: 4, updated: 2, failed: 2, marked_unavailable: 1, alerts: 2 });
    }

    #[test]
    fn errored_check_counts_as_failed_and_round_continues() {
        let mut s = RoundSummary::new(1);
        assert!(s.add_result(Ok(Checked::Updated { alerts: 1 })).is_none());
        let err = s.add_result(Err(anyhow::anyhow!("pool timed out"))).expect("error handed back");
        assert_eq!(err.to_string(), "pool timed out");
        assert!(s.add_result(Ok(Checked::Failed { marked_unavailable: true })).is_none());
        assert_eq!(s, RoundSummary { round: 1, checked: 3, updated: 1, failed: 2, marked_unavailable: 1, alerts: 1 });
    }
}
