use crate::{ResultCode, RunPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurfaceView {
    pub phase: RunPhase,
    pub title: Option<&'static str>,
    pub percentage: u8,
    pub label: String,
    pub progress_events: usize,
    pub cancellable: bool,
    pub cancel_requested: bool,
    pub result: Option<ResultCode>,
    pub error: Option<String>,
}
