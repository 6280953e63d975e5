use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Product;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Fetch, Add, List, Remove, History, Alert }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Fetch => "fetch",
        Phase::Add => "add",
        Phase::List => "list",
        Phase::Remove => "remove",
        Phase::History => "history",
        Phase::Alert => "alert",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Add => info_span!("add"),
        Phase::List => info_span!("list"),
        Phase::Remove => info_span!("remove"),
        Phase::History => info_span!("history"),
        Phase::Alert => info_span!("alert"),
    }}
}

impl OpMarker for Product {
    const NAME: &'static str = "product";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("product") }
}
