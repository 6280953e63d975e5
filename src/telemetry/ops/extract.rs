use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Extract;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ReadFile, Fetch, Parse }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::ReadFile => "read_file",
        Phase::Fetch => "fetch",
        Phase::Parse => "parse",
    }}
    fn span(&self) -> Span { match self {
        Phase::ReadFile => info_span!("read_file"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Parse => info_span!("parse"),
    }}
}

impl OpMarker for Extract {
    const NAME: &'static str = "extract";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("extract") }
}
