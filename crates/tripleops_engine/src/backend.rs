use std::path::Path;

use tripleops_core::{FormatSpec, LoadStrategy, Notation};

use crate::StorageError;

/// Returned by a listener that refuses to let the collaborator continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interrupted at a progress checkpoint")]
pub struct Interrupted;

/// Receives a collaborator's own 0–100 progress for the call in flight.
///
/// Collaborators must stop and propagate the error (usually via `?` into
/// [`StorageError::Interrupted`]) when this returns `Err`.
pub trait ProgressListener {
    fn notify_progress(&mut self, level: f32, section: &str) -> Result<(), Interrupted>;
}

/// Listener for calls made outside of an operation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn notify_progress(&mut self, _level: f32, _section: &str) -> Result<(), Interrupted> {
        Ok(())
    }
}

/// Container and exchange-format capabilities of a storage collaborator.
pub trait TripleStorage: Send + Sync + 'static {
    type Store: Send + Sync + 'static;
    /// Query result iterator. Released by the caller after export.
    type Cursor: Send + 'static;

    fn open_container(
        &self,
        path: &Path,
        strategy: LoadStrategy,
        listener: &mut dyn ProgressListener,
    ) -> Result<Self::Store, StorageError>;

    fn import_exchange(
        &self,
        path: &Path,
        base_id: &str,
        notation: Notation,
        spec: &FormatSpec,
        listener: &mut dyn ProgressListener,
    ) -> Result<Self::Store, StorageError>;

    fn build_secondary_ordering(
        &self,
        store: Self::Store,
        listener: &mut dyn ProgressListener,
    ) -> Result<Self::Store, StorageError>;

    fn save_container(
        &self,
        store: &Self::Store,
        path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError>;

    fn export_exchange(
        &self,
        store: &Self::Store,
        path: &Path,
        notation: Notation,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError>;

    fn export_cursor(
        &self,
        cursor: &mut Self::Cursor,
        path: &Path,
        notation: Notation,
        expected_count: u64,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError>;
}

/// Derived, query-accelerating metadata kept alongside a container.
pub trait CacheMetadata: TripleStorage {
    type Cache: Send + Sync + 'static;

    /// Creates empty metadata bound to `store`.
    fn build_cache_metadata(
        &self,
        store: &Self::Store,
        listener: &mut dyn ProgressListener,
    ) -> Result<Self::Cache, StorageError>;

    /// Reads the cache file at `path` if usable, otherwise generates the
    /// metadata and tries to write it there.
    fn load_cache_metadata(
        &self,
        store: &Self::Store,
        path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<Self::Cache, StorageError>;

    fn generate_statistics(
        &self,
        store: &Self::Store,
        cache: &mut Self::Cache,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError>;

    fn generate_relation_matrix(
        &self,
        store: &Self::Store,
        cache: &mut Self::Cache,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError>;
}
