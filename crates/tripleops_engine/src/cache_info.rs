use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tripleops_logging::{op_debug, op_info, op_warn};

use crate::plain_backend::report_every;
use crate::{AtomicFileWriter, PlainStore, ProgressListener, StorageError};

const CACHE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub triples: u64,
    pub distinct_subjects: u64,
    pub distinct_predicates: u64,
    pub distinct_objects: u64,
    /// Terms used both as subject and as object.
    pub shared_subject_objects: u64,
}

/// One row of the relation matrix: how a predicate is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateRow {
    pub predicate: String,
    pub triples: u64,
    pub distinct_subjects: u64,
    pub distinct_objects: u64,
}

/// Cached metadata for a plain store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheInfo {
    version: u32,
    /// [`PlainStore::fingerprint`] of the store the metadata describes.
    #[serde(default)]
    pub store_fingerprint: Option<String>,
    pub statistics: Option<Statistics>,
    pub relation_matrix: Option<Vec<PredicateRow>>,
}

impl CacheInfo {
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION,
            store_fingerprint: None,
            statistics: None,
            relation_matrix: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.statistics.is_some() && self.relation_matrix.is_some()
    }

    /// Reads `path` if it holds complete metadata for exactly this store,
    /// otherwise generates it and tries to write it back.
    pub(crate) fn load_or_generate(
        store: &PlainStore,
        path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<CacheInfo, StorageError> {
        listener.notify_progress(0.0, "Reading cached metadata")?;
        if let Some(cached) = Self::read(path, store) {
            op_info!("using cached metadata from {}", path.display());
            listener.notify_progress(100.0, "Reading cached metadata")?;
            return Ok(cached);
        }

        let mut info = CacheInfo::new();
        info.generate_statistics(store, listener, 0.0, 50.0)?;
        info.generate_relation_matrix(store, listener, 50.0, 50.0)?;

        match serde_json::to_vec_pretty(&info) {
            Ok(bytes) => {
                if let Err(err) = AtomicFileWriter::new(path).write_bytes(&bytes) {
                    op_warn!("could not write cache file {}: {}", path.display(), err);
                }
            }
            Err(err) => op_warn!("could not serialize cache metadata: {}", err),
        }
        Ok(info)
    }

    /// Reports `offset..offset + span` of the caller's scale.
    pub(crate) fn generate_statistics(
        &mut self,
        store: &PlainStore,
        listener: &mut dyn ProgressListener,
        offset: f32,
        span: f32,
    ) -> Result<(), StorageError> {
        const SECTION: &str = "Generating statistics";
        let triples = store.triples();
        let total = triples.len() as u64;
        listener.notify_progress(offset, SECTION)?;

        let mut subjects = HashSet::new();
        let mut predicates = HashSet::new();
        let mut objects = HashSet::new();
        for (index, triple) in triples.iter().enumerate() {
            subjects.insert(triple.subject.as_str());
            predicates.insert(triple.predicate.as_str());
            objects.insert(triple.object.as_str());
            let done = index as u64 + 1;
            if report_every(done, total) {
                listener.notify_progress(offset + span * done as f32 / total as f32, SECTION)?;
            }
        }

        let shared = subjects.iter().filter(|s| objects.contains(*s)).count();
        self.store_fingerprint = Some(store.fingerprint());
        self.statistics = Some(Statistics {
            triples: total,
            distinct_subjects: subjects.len() as u64,
            distinct_predicates: predicates.len() as u64,
            distinct_objects: objects.len() as u64,
            shared_subject_objects: shared as u64,
        });
        listener.notify_progress(offset + span, SECTION)?;
        op_debug!("statistics: {:?}", self.statistics);
        Ok(())
    }

    pub(crate) fn generate_relation_matrix(
        &mut self,
        store: &PlainStore,
        listener: &mut dyn ProgressListener,
        offset: f32,
        span: f32,
    ) -> Result<(), StorageError> {
        const SECTION: &str = "Generating relation matrix";
        let triples = store.triples();
        let total = triples.len() as u64;
        listener.notify_progress(offset, SECTION)?;

        let mut usage: BTreeMap<&str, (u64, HashSet<&str>, HashSet<&str>)> = BTreeMap::new();
        for (index, triple) in triples.iter().enumerate() {
            let entry = usage.entry(triple.predicate.as_str()).or_default();
            entry.0 += 1;
            entry.1.insert(triple.subject.as_str());
            entry.2.insert(triple.object.as_str());
            let done = index as u64 + 1;
            if report_every(done, total) {
                listener.notify_progress(offset + span * done as f32 / total as f32, SECTION)?;
            }
        }

        self.relation_matrix = Some(
            usage
                .into_iter()
                .map(|(predicate, (count, subjects, objects))| PredicateRow {
                    predicate: predicate.to_string(),
                    triples: count,
                    distinct_subjects: subjects.len() as u64,
                    distinct_objects: objects.len() as u64,
                })
                .collect(),
        );
        listener.notify_progress(offset + span, SECTION)?;
        Ok(())
    }

    fn read(path: &Path, store: &PlainStore) -> Option<CacheInfo> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                op_warn!("failed to read cache file {}: {}", path.display(), err);
                return None;
            }
        };
        let info: CacheInfo = match serde_json::from_slice(&bytes) {
            Ok(info) => info,
            Err(err) => {
                op_warn!("failed to parse cache file {}: {}", path.display(), err);
                return None;
            }
        };
        let fresh = info.version == CACHE_VERSION
            && info.is_complete()
            && info.store_fingerprint.as_deref() == Some(store.fingerprint().as_str());
        if !fresh {
            op_info!("cache file {} is stale, regenerating", path.display());
            return None;
        }
        Some(info)
    }
}
