use crate::view_model::SurfaceView;
use crate::{OperationKind, OutcomeKind, ResultCode};

/// Lifecycle of one run as seen by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Configured,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunPhase::Succeeded | RunPhase::Failed | RunPhase::Cancelled
        )
    }
}

impl From<OutcomeKind> for RunPhase {
    fn from(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Succeeded => RunPhase::Succeeded,
            OutcomeKind::Failed => RunPhase::Failed,
            OutcomeKind::Cancelled => RunPhase::Cancelled,
        }
    }
}

/// Consumer-owned state of the progress surface for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurfaceState {
    phase: RunPhase,
    kind: Option<OperationKind>,
    cancel_enabled: bool,
    cancel_requested: bool,
    percentage: u8,
    label: String,
    progress_events: usize,
    error: Option<String>,
}

impl SurfaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    pub fn view(&self) -> SurfaceView {
        SurfaceView {
            phase: self.phase,
            title: self.kind.map(OperationKind::title),
            percentage: self.percentage,
            label: self.label.clone(),
            progress_events: self.progress_events,
            cancellable: self.cancel_enabled,
            cancel_requested: self.cancel_requested,
            result: self.result_code(),
            error: self.error.clone(),
        }
    }

    pub fn result_code(&self) -> Option<ResultCode> {
        match self.phase {
            RunPhase::Succeeded => Some(ResultCode::Success),
            RunPhase::Failed => Some(ResultCode::Failure),
            RunPhase::Cancelled => Some(ResultCode::Cancelled),
            RunPhase::Configured | RunPhase::Running => None,
        }
    }

    pub(crate) fn start(&mut self, kind: OperationKind, cancel_enabled: bool) {
        self.phase = RunPhase::Running;
        self.kind = Some(kind);
        self.cancel_enabled = cancel_enabled;
    }

    pub(crate) fn cancel_enabled(&self) -> bool {
        self.cancel_enabled
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub(crate) fn mark_cancel_requested(&mut self) {
        self.cancel_requested = true;
    }

    /// Applies a progress report and returns `(percentage_changed, label_changed)`.
    /// The percentage never moves backwards.
    pub(crate) fn apply_progress(&mut self, percentage: u8, label: String) -> (bool, bool) {
        let first = self.progress_events == 0;
        self.progress_events += 1;
        let next = percentage.max(self.percentage);
        let percentage_changed = first || next != self.percentage;
        let label_changed = label != self.label;
        self.percentage = next;
        if label_changed {
            self.label = label;
        }
        (percentage_changed, label_changed)
    }

    pub(crate) fn finish(&mut self, outcome: OutcomeKind, error: Option<String>) {
        self.phase = outcome.into();
        self.error = error;
    }
}
