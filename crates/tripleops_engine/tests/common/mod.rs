#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use tripleops_core::{FormatSpec, LoadStrategy, Notation, ProgressEvent, ResultCode};
use tripleops_engine::{
    CacheMetadata, ProgressListener, ProgressSink, ProgressSurface, StorageError, TripleStorage,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tripleops_logging::initialize_for_tests);
}

type TickHook = Box<dyn Fn(&'static str, usize) + Send + Sync>;

/// Collaborator that reports a fixed tick script from every call and can be
/// told to fail in, or misbehave around, a named call.
pub struct ScriptedBackend {
    ticks: Vec<f32>,
    fail_in: Option<&'static str>,
    swallow_interrupt: bool,
    on_tick: Option<TickHook>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedBackend {
    pub fn new(ticks: &[f32]) -> Self {
        Self {
            ticks: ticks.to_vec(),
            fail_in: None,
            swallow_interrupt: false,
            on_tick: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_in(mut self, call: &'static str) -> Self {
        self.fail_in = Some(call);
        self
    }

    /// Stop ticking on interruption but report success anyway.
    pub fn swallowing_interrupts(mut self) -> Self {
        self.swallow_interrupt = true;
        self
    }

    /// Runs before each tick with the call name and the tick index.
    pub fn on_tick(mut self, hook: impl Fn(&'static str, usize) + Send + Sync + 'static) -> Self {
        self.on_tick = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn step(
        &self,
        call: &'static str,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(call);
        for (index, &tick) in self.ticks.iter().enumerate() {
            if let Some(hook) = &self.on_tick {
                hook(call, index);
            }
            match listener.notify_progress(tick, call) {
                Ok(()) => {}
                Err(_) if self.swallow_interrupt => break,
                Err(interrupted) => return Err(interrupted.into()),
            }
        }
        if self.fail_in == Some(call) {
            return Err(StorageError::InvalidContainer {
                path: Path::new(call).to_path_buf(),
                message: format!("scripted failure in {call}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScriptedStore {
    pub ordered: bool,
}

/// Counts how often it is dropped.
#[derive(Debug)]
pub struct ScriptedCursor {
    drops: Arc<AtomicUsize>,
}

impl ScriptedCursor {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                drops: Arc::clone(&drops),
            },
            drops,
        )
    }
}

impl Drop for ScriptedCursor {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl TripleStorage for ScriptedBackend {
    type Store = ScriptedStore;
    type Cursor = ScriptedCursor;

    fn open_container(
        &self,
        _path: &Path,
        _strategy: LoadStrategy,
        listener: &mut dyn ProgressListener,
    ) -> Result<ScriptedStore, StorageError> {
        self.step("open_container", listener)?;
        Ok(ScriptedStore::default())
    }

    fn import_exchange(
        &self,
        _path: &Path,
        _base_id: &str,
        _notation: Notation,
        _spec: &FormatSpec,
        listener: &mut dyn ProgressListener,
    ) -> Result<ScriptedStore, StorageError> {
        self.step("import_exchange", listener)?;
        Ok(ScriptedStore::default())
    }

    fn build_secondary_ordering(
        &self,
        mut store: ScriptedStore,
        listener: &mut dyn ProgressListener,
    ) -> Result<ScriptedStore, StorageError> {
        self.step("build_secondary_ordering", listener)?;
        store.ordered = true;
        Ok(store)
    }

    fn save_container(
        &self,
        _store: &ScriptedStore,
        _path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.step("save_container", listener)
    }

    fn export_exchange(
        &self,
        _store: &ScriptedStore,
        _path: &Path,
        _notation: Notation,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.step("export_exchange", listener)
    }

    fn export_cursor(
        &self,
        _cursor: &mut ScriptedCursor,
        _path: &Path,
        _notation: Notation,
        expected_count: u64,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        if expected_count == 0 {
            self.calls.lock().unwrap().push("export_cursor");
            return Ok(());
        }
        self.step("export_cursor", listener)
    }
}

impl CacheMetadata for ScriptedBackend {
    type Cache = Vec<&'static str>;

    fn build_cache_metadata(
        &self,
        _store: &ScriptedStore,
        _listener: &mut dyn ProgressListener,
    ) -> Result<Vec<&'static str>, StorageError> {
        self.calls.lock().unwrap().push("build_cache_metadata");
        Ok(Vec::new())
    }

    fn load_cache_metadata(
        &self,
        _store: &ScriptedStore,
        _path: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<Vec<&'static str>, StorageError> {
        self.step("load_cache_metadata", listener)?;
        Ok(vec!["statistics", "relation_matrix"])
    }

    fn generate_statistics(
        &self,
        _store: &ScriptedStore,
        cache: &mut Vec<&'static str>,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.step("generate_statistics", listener)?;
        cache.push("statistics");
        Ok(())
    }

    fn generate_relation_matrix(
        &self,
        _store: &ScriptedStore,
        cache: &mut Vec<&'static str>,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), StorageError> {
        self.step("generate_relation_matrix", listener)?;
        cache.push("relation_matrix");
        Ok(())
    }
}

/// Sink that keeps everything it is given.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.events().iter().map(|event| event.percentage).collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Open { title: String, cancellable: bool },
    Progress(u8),
    Label(String),
    Close(ResultCode),
    Error(String),
}

/// Surface that records every call; optionally clicks cancel once it has
/// seen `cancel_after` progress updates.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    cancel_after: Option<usize>,
    clicked: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicking_cancel_after(progress_updates: usize) -> Self {
        Self {
            cancel_after: Some(progress_updates),
            ..Self::default()
        }
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Progress(percentage) => Some(*percentage),
                _ => None,
            })
            .collect()
    }

    pub fn closes(&self) -> Vec<ResultCode> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Close(code) => Some(*code),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSurface for RecordingSurface {
    fn open(&mut self, title: &str, cancellable: bool) {
        self.calls.push(SurfaceCall::Open {
            title: title.to_string(),
            cancellable,
        });
    }

    fn set_progress(&mut self, percentage: u8) {
        self.calls.push(SurfaceCall::Progress(percentage));
    }

    fn set_label(&mut self, label: &str) {
        self.calls.push(SurfaceCall::Label(label.to_string()));
    }

    fn cancel_requested(&mut self) -> bool {
        let Some(threshold) = self.cancel_after else {
            return false;
        };
        if !self.clicked && self.percentages().len() >= threshold {
            self.clicked = true;
            return true;
        }
        false
    }

    fn close(&mut self, code: ResultCode) {
        self.calls.push(SurfaceCall::Close(code));
    }

    fn show_error(&mut self, message: &str) {
        self.calls.push(SurfaceCall::Error(message.to_string()));
    }
}
