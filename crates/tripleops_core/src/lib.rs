//! Tripleops core: pure operation vocabulary, progress composition and the
//! progress-surface state machine. Nothing in this crate performs I/O.
mod effect;
mod kind;
mod msg;
mod notation;
mod outcome;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, ProtocolViolation};
pub use kind::OperationKind;
pub use msg::Msg;
pub use notation::{FormatSpec, FormatSpecError, LoadStrategy, Notation, NotationError};
pub use outcome::{Outcome, OutcomeKind, ResultCode};
pub use progress::{ProgressEvent, ProgressRangeMapper, RangeError, RangeMapping};
pub use state::{RunPhase, SurfaceState};
pub use update::update;
pub use view_model::SurfaceView;
