use std::fmt;

use crate::ResultCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Open {
        title: &'static str,
        cancellable: bool,
    },
    SetProgress(u8),
    SetLabel(String),
    /// Ask the worker to stop at its next checkpoint.
    RequestCancel,
    Close(ResultCode),
    /// Blocking error notification; only ever follows `Close(Failure)`.
    ShowError(String),
    Fault(ProtocolViolation),
}

/// Event sequences that correct wiring never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    NotStarted,
    AlreadyStarted,
    ProgressAfterTerminal,
    DuplicateTerminal,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::NotStarted => write!(f, "event received before the run started"),
            ProtocolViolation::AlreadyStarted => write!(f, "run started twice"),
            ProtocolViolation::ProgressAfterTerminal => {
                write!(f, "progress received after the terminal outcome")
            }
            ProtocolViolation::DuplicateTerminal => write!(f, "second terminal outcome received"),
        }
    }
}
