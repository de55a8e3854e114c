use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tripleops_core::{FormatSpec, LoadStrategy, Notation};
use tripleops_logging::{op_debug, op_warn};

use crate::persist::is_gzip;
use crate::{
    container, ntriples, AtomicFileWriter, CacheInfo, CacheMetadata, ProgressListener,
    StorageError, TripleStorage,
};

/// Format-spec key: when `false`, malformed input lines are skipped.
pub const STRICT_PARSING_KEY: &str = "parser.strict";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Lookup pattern; `None` matches any term.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriplePattern {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
}

impl TriplePattern {
    pub fn matches(&self, triple: &Triple) -> bool {
        let term_matches = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map_or(true, |wanted| wanted == actual)
        };
        term_matches(&self.subject, &triple.subject)
            && term_matches(&self.predicate, &triple.predicate)
            && term_matches(&self.object, &triple.object)
    }
}

/// In-memory triple set, sorted subject-predicate-object without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlainStore {
    triples: Vec<Triple>,
    base_id: Option<String>,
    /// Indices into `triples` in object-predicate-subject order.
    object_order: Option<Vec<usize>>,
}

impl PlainStore {
    pub fn new(mut triples: Vec<Triple>, base_id: Option<String>) -> Self {
        triples.sort_unstable();
        triples.dedup();
        Self {
            triples,
            base_id,
            object_order: None,
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn base_id(&self) -> Option<&str> {
        self.base_id.as_deref()
    }

    /// Hex SHA-256 over the sorted triples. Equal for two stores exactly
    /// when they hold the same triples.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for triple in &self.triples {
            for term in [&triple.subject, &triple.predicate, &triple.object] {
                hasher.update(term.as_bytes());
                hasher.update([0u8]);
            }
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            use std::fmt::Write;
            let _ = write!(&mut hex, "{byte:02x}");
        }
        hex
    }

    pub fn has_secondary_ordering(&self) -> bool {
        self.object_order.is_some()
    }

    pub fn search(&self, pattern: &TriplePattern) -> Vec<Triple> {
        let candidates: Box<dyn Iterator<Item = &Triple> + '_> =
            match (&pattern.subject, &pattern.object, &self.object_order) {
                (Some(subject), _, _) => {
                    let start = self
                        .triples
                        .partition_point(|t| t.subject.as_str() < subject.as_str());
                    let end = self
                        .triples
                        .partition_point(|t| t.subject.as_str() <= subject.as_str());
                    Box::new(self.triples[start..end].iter())
                }
                (None, Some(object), Some(order)) => {
                    let start = order
                        .partition_point(|&i| self.triples[i].object.as_str() < object.as_str());
                    let end = order
                        .partition_point(|&i| self.triples[i].object.as_str() <= object.as_str());
                    Box::new(order[start..end].iter().map(|&i| &self.triples[i]))
                }
                _ => Box::new(self.triples.iter()),
            };
        candidates
            .filter(|triple| pattern.matches(triple))
            .cloned()
            .collect()
    }
}

/// Query results handed to [`TripleStorage::export_cursor`].
#[derive(Debug)]
pub struct PlainCursor {
    inner: std::vec::IntoIter<Triple>,
}

impl From<Vec<Triple>> for PlainCursor {
    fn from(triples: Vec<Triple>) -> Self {
        Self {
            inner: triples.into_iter(),
        }
    }
}

impl Iterator for PlainCursor {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        self.inner.next()
    }
}

/// Uncompressed reference collaborator: N-Triples in and out, a line-per-triple
/// JSON container, and statistics plus a per-predicate relation matrix as
/// cache metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainBackend;

impl PlainBackend {
    pub fn new() -> Self {
        Self
    }

    /// Runs a pattern lookup and returns the cursor with its exact size.
    pub fn search(&self, store: &PlainStore, pattern: &TriplePattern) -> (PlainCursor, u64) {
        let hits = store.search(pattern);
        let count = hits.len() as u64;
        (PlainCursor::from(hits), count)
    }

    fn write_ntriples(
        &self,
        triples: impl Iterator<Item = Triple>,
        path: &Path,
        notation: Notation,
        expected_count: u64,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        if notation != Notation::NTriples {
            return Err(StorageError::UnsupportedNotation(notation));
        }
        const SECTION: &str = "Writing triples";
        if expected_count > 0 {
            listener.notify_progress(0.0, SECTION)?;
        }
        AtomicFileWriter::new(path).write_with(|out| {
            for (index, triple) in triples.enumerate() {
                ntriples::write_triple(out, &triple)?;
                let done = index as u64 + 1;
                if expected_count > 0 && report_every(done, expected_count) {
                    let level = 100.0 * done as f32 / expected_count as f32;
                    listener.notify_progress(level, SECTION)?;
                }
            }
            Ok(())
        })
    }
}

impl TripleStorage for PlainBackend {
    type Store = PlainStore;
    type Cursor = PlainCursor;

    fn open_container(
        &self,
        path: &Path,
        strategy: LoadStrategy,
        listener: &mut dyn ProgressListener,
    ) -> Result<PlainStore, StorageError> {
        container::read_container(path, strategy, listener)
    }

    fn import_exchange(
        &self,
        path: &Path,
        base_id: &str,
        notation: Notation,
        spec: &FormatSpec,
        listener: &mut dyn ProgressListener,
    ) -> Result<PlainStore, StorageError> {
        if notation != Notation::NTriples {
            return Err(StorageError::UnsupportedNotation(notation));
        }
        const SECTION: &str = "Parsing input";
        let strict = spec.get_bool(STRICT_PARSING_KEY).unwrap_or(true);
        let base = Some(base_id.trim()).filter(|base| !base.is_empty());
        listener.notify_progress(0.0, SECTION)?;

        let text = read_text(path)?;
        let total = text.len().max(1) as f32;
        let line_count = text.lines().count() as u64;
        let mut consumed = 0usize;
        let mut triples = Vec::new();
        for (index, line) in text.lines().enumerate() {
            consumed += line.len() + 1;
            match ntriples::parse_line(line, base) {
                Ok(Some(triple)) => triples.push(triple),
                Ok(None) => {}
                Err(message) if strict => {
                    return Err(StorageError::Malformed {
                        path: path.to_path_buf(),
                        line: index + 1,
                        message,
                    });
                }
                Err(message) => {
                    op_warn!("{}:{}: skipping line: {}", path.display(), index + 1, message);
                }
            }
            if report_every(index as u64 + 1, line_count) {
                let level = 95.0 * (consumed as f32 / total).min(1.0);
                listener.notify_progress(level, SECTION)?;
            }
        }

        op_debug!("parsed {} statements from {}", triples.len(), path.display());
        listener.notify_progress(95.0, "Sorting triples")?;
        let store = PlainStore::new(triples, base.map(str::to_string));
        listener.notify_progress(100.0, "Sorting triples")?;
        Ok(store)
    }

    fn build_secondary_ordering(
        &self,
        mut store: PlainStore,
        listener: &mut dyn ProgressListener,
    ) -> Result<PlainStore, StorageError> {
        listener.notify_progress(0.0, "Sorting by object")?;
        let triples = &store.triples;
        let mut order: Vec<usize> = (0..triples.len()).collect();
        order.sort_unstable_by(|&a, &b| {
            let (a, b) = (&triples[a], &triples[b]);
            (&a.object, &a.predicate, &a.subject).cmp(&(&b.object, &b.predicate, &b.subject))
        });
        store.object_order = Some(order);
        listener.notify_progress(100.0, "Sorting by object")?;
        Ok(store)
    }

    fn save_container(
        &self,
        store: &PlainStore,
        path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        container::write_container(store, path, listener)
    }

    fn export_exchange(
        &self,
        store: &PlainStore,
        path: &Path,
        notation: Notation,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        let count = store.len() as u64;
        self.write_ntriples(store.triples().iter().cloned(), path, notation, count, listener)?;
        listener.notify_progress(100.0, "Writing triples")?;
        Ok(())
    }

    fn export_cursor(
        &self,
        cursor: &mut PlainCursor,
        path: &Path,
        notation: Notation,
        expected_count: u64,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.write_ntriples(cursor.by_ref(), path, notation, expected_count, listener)
    }
}

impl CacheMetadata for PlainBackend {
    type Cache = CacheInfo;

    fn build_cache_metadata(
        &self,
        _store: &PlainStore,
        _listener: &mut dyn ProgressListener,
    ) -> Result<CacheInfo, StorageError> {
        Ok(CacheInfo::new())
    }

    fn load_cache_metadata(
        &self,
        store: &PlainStore,
        path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<CacheInfo, StorageError> {
        CacheInfo::load_or_generate(store, path, listener)
    }

    fn generate_statistics(
        &self,
        store: &PlainStore,
        cache: &mut CacheInfo,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        cache.generate_statistics(store, listener, 0.0, 100.0)
    }

    fn generate_relation_matrix(
        &self,
        store: &PlainStore,
        cache: &mut CacheInfo,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        cache.generate_relation_matrix(store, listener, 0.0, 100.0)
    }
}

/// True roughly a hundred times over `total` items, and on the last one.
pub(crate) fn report_every(done: u64, total: u64) -> bool {
    let stride = (total / 100).max(1);
    done % stride == 0 || done == total
}

fn read_text(path: &Path) -> Result<String, StorageError> {
    if is_gzip(path) {
        let file = fs::File::open(path).map_err(|e| StorageError::file(path, e))?;
        let mut text = String::new();
        GzDecoder::new(file)
            .read_to_string(&mut text)
            .map_err(|e| StorageError::file(path, e))?;
        Ok(text)
    } else {
        fs::read_to_string(path).map_err(|e| StorageError::file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PlainStore {
        PlainStore::new(
            vec![
                Triple::new("<b>", "<p>", "<x>"),
                Triple::new("<a>", "<p>", "<y>"),
                Triple::new("<a>", "<q>", "<x>"),
                Triple::new("<a>", "<p>", "<y>"),
            ],
            None,
        )
    }

    #[test]
    fn store_is_sorted_and_deduplicated() {
        let store = store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.triples()[0], Triple::new("<a>", "<p>", "<y>"));
    }

    #[test]
    fn search_by_subject_and_by_object() {
        let store = PlainBackend
            .build_secondary_ordering(store(), &mut crate::NoProgress)
            .unwrap();
        let by_subject = store.search(&TriplePattern {
            subject: Some("<a>".into()),
            ..TriplePattern::default()
        });
        assert_eq!(by_subject.len(), 2);

        let by_object = store.search(&TriplePattern {
            object: Some("<x>".into()),
            ..TriplePattern::default()
        });
        assert_eq!(
            by_object,
            vec![
                Triple::new("<b>", "<p>", "<x>"),
                Triple::new("<a>", "<q>", "<x>"),
            ]
        );

        let none = store.search(&TriplePattern {
            predicate: Some("<zzz>".into()),
            ..TriplePattern::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn fingerprint_follows_content_not_insertion_order() {
        let reordered = PlainStore::new(
            vec![
                Triple::new("<a>", "<q>", "<x>"),
                Triple::new("<a>", "<p>", "<y>"),
                Triple::new("<b>", "<p>", "<x>"),
            ],
            Some("http://ex.org/".into()),
        );
        assert_eq!(store().fingerprint(), reordered.fingerprint());
        assert_eq!(store().fingerprint().len(), 64);

        let shifted = PlainStore::new(
            vec![
                Triple::new("<a>", "<p>", "<y>"),
                Triple::new("<a>", "<q>", "<x>"),
                Triple::new("<b>", "<p>", "<xx>"),
            ],
            None,
        );
        assert_ne!(store().fingerprint(), shifted.fingerprint());

        let split = PlainStore::new(vec![Triple::new("<a", "b>", "<c>")], None);
        let joined = PlainStore::new(vec![Triple::new("<ab", ">", "<c>")], None);
        assert_ne!(split.fingerprint(), joined.fingerprint());
    }

    #[test]
    fn report_every_hits_last_item() {
        assert!(report_every(7, 7));
        assert!(report_every(1, 50));
        assert!(!report_every(1, 1000));
        assert!(report_every(10, 1000));
    }
}
