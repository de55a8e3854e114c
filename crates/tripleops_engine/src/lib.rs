//! Tripleops engine: operation execution, progress relay, cancellation and
//! the worker/consumer runner, plus a plain-text reference storage backend.
mod backend;
mod cache_info;
mod cancel;
mod container;
mod error;
mod ntriples;
mod operation;
mod paths;
mod persist;
mod plain_backend;
mod relay;
mod runner;
mod types;

pub use backend::{CacheMetadata, Interrupted, NoProgress, ProgressListener, TripleStorage};
pub use cache_info::{CacheInfo, PredicateRow, Statistics};
pub use cancel::CancellationToken;
pub use error::{OperationError, StorageError};
pub use operation::{LoadedStore, Operation, OperationOutput, OperationParameters};
pub use paths::{derive_cache_path, CACHE_EXTENSION, COMPRESSED_SUFFIXES};
pub use persist::{ensure_output_dir, AtomicFileWriter};
pub use plain_backend::{
    PlainBackend, PlainCursor, PlainStore, Triple, TriplePattern, STRICT_PARSING_KEY,
};
pub use relay::{ChannelProgressSink, ProgressRelay, ProgressSink};
pub use runner::{OperationRunner, ProgressSurface, RunReport, RunnerConfig};
pub use types::EngineEvent;
