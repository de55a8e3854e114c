use tripleops_core::{Outcome, ProgressEvent};

/// Worker-to-consumer message. For one run, any number of `Progress` events
/// are followed by exactly one `Finished`, which is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent<T> {
    Progress(ProgressEvent),
    Finished(Outcome<T>),
}
