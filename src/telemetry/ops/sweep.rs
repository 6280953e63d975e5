use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Sweep;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Round, SelectDue, Pace, Check, Record, Alerts }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Round => "round",
        Phase::SelectDue => "select_due",
        Phase::Pace => "pace",
        Phase::Check => "check",
        Phase::Record => "record",
        Phase::Alerts => "alerts",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Round => info_span!("round"),
        Phase::SelectDue => info_span!("select_due"),
        Phase::Pace => info_span!("pace"),
        Phase::Check => info_span!("check"),
        Phase::Record => info_span!("record"),
        Phase::Alerts => info_span!("alerts"),
    }}
}

impl OpMarker for Sweep {
    const NAME: &'static str = "sweep";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("sweep") }
}
