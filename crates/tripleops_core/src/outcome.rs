use std::fmt;

/// Terminal result of one run. Exactly one is produced per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Succeeded(T),
    Failed(String),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Succeeded(_) => OutcomeKind::Succeeded,
            Outcome::Failed(_) => OutcomeKind::Failed,
            Outcome::Cancelled => OutcomeKind::Cancelled,
        }
    }

    pub fn result_code(&self) -> ResultCode {
        self.kind().result_code()
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn succeeded(self) -> Option<T> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }
}

/// Payload-free view of an [`Outcome`], used by the surface state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Succeeded,
    Failed,
    Cancelled,
}

impl OutcomeKind {
    pub fn result_code(self) -> ResultCode {
        match self {
            OutcomeKind::Succeeded => ResultCode::Success,
            OutcomeKind::Failed => ResultCode::Failure,
            OutcomeKind::Cancelled => ResultCode::Cancelled,
        }
    }
}

/// Consumer-visible code returned when the progress surface closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success = 0,
    Failure = 1,
    Cancelled = 2,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Success => write!(f, "success"),
            ResultCode::Failure => write!(f, "failure"),
            ResultCode::Cancelled => write!(f, "cancelled"),
        }
    }
}
