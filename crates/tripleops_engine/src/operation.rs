use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tripleops_core::{
    FormatSpec, LoadStrategy, Notation, OperationKind, Outcome, ProgressRangeMapper, RangeMapping,
};
use tripleops_logging::{op_debug, op_info, op_trace, op_warn};

use crate::relay::Checkpoint;
use crate::{
    derive_cache_path, CacheMetadata, CancellationToken, ProgressListener, ProgressRelay,
    ProgressSink, StorageError,
};

const LOAD_OPEN: RangeMapping = RangeMapping::spanning(0, 70);
// Reserved for an intermediate load phase; nothing reports into it yet.
const LOAD_RESERVED: RangeMapping = RangeMapping::spanning(70, 90);
const LOAD_CACHE: RangeMapping = RangeMapping::spanning(90, 100);

const IMPORT_CONVERT: RangeMapping = RangeMapping::spanning(0, 80);
const IMPORT_ORDERING: RangeMapping = RangeMapping::spanning(80, 90);
const IMPORT_STATISTICS: RangeMapping = RangeMapping::spanning(90, 95);
const IMPORT_MATRIX: RangeMapping = RangeMapping::spanning(95, 100);

/// Kind-specific inputs recorded by one of the [`Operation`] setup calls.
pub enum OperationParameters<B: CacheMetadata> {
    LoadContainer {
        path: PathBuf,
        strategy: LoadStrategy,
    },
    ImportExchangeFormat {
        path: PathBuf,
        notation: Notation,
        spec: FormatSpec,
        base_id: String,
    },
    SaveContainer {
        store: Arc<B::Store>,
        path: PathBuf,
    },
    ExportExchangeFormat {
        store: Arc<B::Store>,
        path: PathBuf,
        notation: Notation,
    },
    ExportQueryResults {
        cursor: B::Cursor,
        expected_count: u64,
        path: PathBuf,
        notation: Notation,
    },
}

impl<B: CacheMetadata> OperationParameters<B> {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParameters::LoadContainer { .. } => OperationKind::LoadContainer,
            OperationParameters::ImportExchangeFormat { .. } => {
                OperationKind::ImportExchangeFormat
            }
            OperationParameters::SaveContainer { .. } => OperationKind::SaveContainer,
            OperationParameters::ExportExchangeFormat { .. } => {
                OperationKind::ExportExchangeFormat
            }
            OperationParameters::ExportQueryResults { .. } => OperationKind::ExportQueryResults,
        }
    }

    /// The file read (load/import) or written (save/export).
    pub fn path(&self) -> &Path {
        match self {
            OperationParameters::LoadContainer { path, .. }
            | OperationParameters::ImportExchangeFormat { path, .. }
            | OperationParameters::SaveContainer { path, .. }
            | OperationParameters::ExportExchangeFormat { path, .. }
            | OperationParameters::ExportQueryResults { path, .. } => path,
        }
    }
}

/// Store and cache produced by a load or import.
pub struct LoadedStore<B: CacheMetadata> {
    pub store: B::Store,
    pub cache: B::Cache,
}

pub enum OperationOutput<B: CacheMetadata> {
    Loaded(LoadedStore<B>),
    /// Write-style kinds have nothing to hand back.
    Written,
}

impl<B: CacheMetadata> OperationOutput<B> {
    pub fn into_loaded(self) -> Option<LoadedStore<B>> {
        match self {
            OperationOutput::Loaded(loaded) => Some(loaded),
            OperationOutput::Written => None,
        }
    }
}

impl<B: CacheMetadata> fmt::Debug for OperationOutput<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutput::Loaded(_) => f.write_str("Loaded(..)"),
            OperationOutput::Written => f.write_str("Written"),
        }
    }
}

/// One configured long-running operation.
///
/// Built by a kind-specific setup call, then consumed by
/// [`Operation::execute`], so it can run at most once.
pub struct Operation<B: CacheMetadata> {
    params: OperationParameters<B>,
}

impl<B: CacheMetadata> Operation<B> {
    pub fn load_container(path: impl Into<PathBuf>) -> Self {
        Self::load_container_with(path, LoadStrategy::default())
    }

    pub fn load_container_with(path: impl Into<PathBuf>, strategy: LoadStrategy) -> Self {
        Self {
            params: OperationParameters::LoadContainer {
                path: path.into(),
                strategy,
            },
        }
    }

    pub fn import_exchange(
        path: impl Into<PathBuf>,
        notation: Notation,
        spec: FormatSpec,
        base_id: impl Into<String>,
    ) -> Self {
        Self {
            params: OperationParameters::ImportExchangeFormat {
                path: path.into(),
                notation,
                spec,
                base_id: base_id.into(),
            },
        }
    }

    pub fn save_container(store: Arc<B::Store>, path: impl Into<PathBuf>) -> Self {
        Self {
            params: OperationParameters::SaveContainer {
                store,
                path: path.into(),
            },
        }
    }

    pub fn export_exchange(
        store: Arc<B::Store>,
        path: impl Into<PathBuf>,
        notation: Notation,
    ) -> Self {
        Self {
            params: OperationParameters::ExportExchangeFormat {
                store,
                path: path.into(),
                notation,
            },
        }
    }

    /// Takes ownership of `cursor`; it is released when the run ends,
    /// whatever the outcome.
    pub fn export_query_results(
        cursor: B::Cursor,
        expected_count: u64,
        path: impl Into<PathBuf>,
        notation: Notation,
    ) -> Self {
        Self {
            params: OperationParameters::ExportQueryResults {
                cursor,
                expected_count,
                path: path.into(),
                notation,
            },
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.params.kind()
    }

    pub fn parameters(&self) -> &OperationParameters<B> {
        &self.params
    }

    /// Runs the body on the calling thread and returns the single terminal
    /// outcome. `cancel` is `None` when the run is not cancellable.
    pub fn execute(
        self,
        backend: &B,
        sink: &dyn ProgressSink,
        cancel: Option<&CancellationToken>,
    ) -> Outcome<OperationOutput<B>> {
        let kind = self.kind();
        op_info!("starting {} on {}", kind, self.params.path().display());

        let mut run = Execution {
            backend,
            relay: ProgressRelay::new(sink),
            cancel,
        };
        match run.dispatch(self.params) {
            Ok(output) => {
                run.relay.complete(kind.completion_label());
                op_info!("{} succeeded", kind);
                Outcome::Succeeded(output)
            }
            Err(Halt::Cancelled) => {
                op_info!("{} cancelled by request", kind);
                Outcome::Cancelled
            }
            Err(Halt::Failed(err)) => {
                op_warn!("operation failed: {}: {}", kind, err);
                Outcome::Failed(err.to_string())
            }
        }
    }
}

impl<B: CacheMetadata> fmt::Debug for Operation<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind())
            .field("path", &self.params.path())
            .finish()
    }
}

enum Halt {
    Cancelled,
    Failed(StorageError),
}

struct Execution<'a, B> {
    backend: &'a B,
    relay: ProgressRelay<'a>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, B: CacheMetadata> Execution<'a, B> {
    fn dispatch(&mut self, params: OperationParameters<B>) -> Result<OperationOutput<B>, Halt> {
        match params {
            OperationParameters::LoadContainer { path, strategy } => {
                let store = self.phase(LOAD_OPEN, "Loading container", |b, l| {
                    b.open_container(&path, strategy, l)
                })?;
                op_trace!(
                    "phase [{}, {}] reserved, nothing to do",
                    LOAD_RESERVED.lower(),
                    LOAD_RESERVED.upper()
                );
                let cache_path = derive_cache_path(&path);
                let cache = self.phase(LOAD_CACHE, "Loading cached metadata", |b, l| {
                    b.load_cache_metadata(&store, &cache_path, l)
                })?;
                Ok(OperationOutput::Loaded(LoadedStore { store, cache }))
            }
            OperationParameters::ImportExchangeFormat {
                path,
                notation,
                spec,
                base_id,
            } => {
                let store = self.phase(IMPORT_CONVERT, "Converting input", |b, l| {
                    b.import_exchange(&path, &base_id, notation, &spec, l)
                })?;
                let store = self.phase(IMPORT_ORDERING, "Building secondary ordering", |b, l| {
                    b.build_secondary_ordering(store, l)
                })?;
                let mut cache = self.phase(IMPORT_STATISTICS, "Generating statistics", |b, l| {
                    let mut cache = b.build_cache_metadata(&store, l)?;
                    b.generate_statistics(&store, &mut cache, l)?;
                    Ok(cache)
                })?;
                self.phase(IMPORT_MATRIX, "Generating relation matrix", |b, l| {
                    b.generate_relation_matrix(&store, &mut cache, l)
                })?;
                Ok(OperationOutput::Loaded(LoadedStore { store, cache }))
            }
            OperationParameters::SaveContainer { store, path } => {
                self.phase(RangeMapping::FULL, "Saving container", |b, l| {
                    b.save_container(&store, &path, l)
                })?;
                Ok(OperationOutput::Written)
            }
            OperationParameters::ExportExchangeFormat {
                store,
                path,
                notation,
            } => {
                self.phase(RangeMapping::FULL, "Exporting", |b, l| {
                    b.export_exchange(&store, &path, notation, l)
                })?;
                Ok(OperationOutput::Written)
            }
            OperationParameters::ExportQueryResults {
                mut cursor,
                expected_count,
                path,
                notation,
            } => {
                let result = self.phase(RangeMapping::FULL, "Exporting results", |b, l| {
                    b.export_cursor(&mut cursor, &path, notation, expected_count, l)
                });
                drop(cursor);
                op_trace!("result cursor released");
                result.map(|()| OperationOutput::Written)
            }
        }
    }

    /// Runs one collaborator call behind a fresh mapper. Cancellation is
    /// checked before the call and at every progress callback inside it.
    fn phase<T>(
        &mut self,
        range: RangeMapping,
        name: &'static str,
        work: impl FnOnce(&B, &mut dyn ProgressListener) -> Result<T, StorageError>,
    ) -> Result<T, Halt> {
        if self.cancel.is_some_and(CancellationToken::is_requested) {
            return Err(Halt::Cancelled);
        }
        op_debug!("phase {:?} mapped to [{}, {}]", name, range.lower(), range.upper());

        let mut checkpoint = Checkpoint::new(
            ProgressRangeMapper::new(range, name),
            &mut self.relay,
            self.cancel,
        );
        let result = work(self.backend, &mut checkpoint);
        // An interrupted collaborator may report success or an unrelated
        // error on its way out; the interruption wins either way.
        if checkpoint.interrupted() {
            return Err(Halt::Cancelled);
        }
        match result {
            Ok(value) => Ok(value),
            Err(StorageError::Interrupted(_)) => Err(Halt::Cancelled),
            Err(err) => Err(Halt::Failed(err)),
        }
    }
}
