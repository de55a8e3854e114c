use crate::{OperationKind, OutcomeKind, ProgressEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The worker was scheduled for a run of this kind.
    Started {
        kind: OperationKind,
        cancel_enabled: bool,
    },
    /// Remapped progress relayed from the worker.
    Progress(ProgressEvent),
    /// User activated the cancel affordance.
    CancelClicked,
    /// The worker delivered its terminal outcome.
    Finished {
        outcome: OutcomeKind,
        error: Option<String>,
    },
}
