use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tripleops_core::{update, Effect, Msg, Outcome, ResultCode, SurfaceState};
use tripleops_logging::{op_debug, op_error, op_info};

use crate::{
    CacheMetadata, CancellationToken, ChannelProgressSink, EngineEvent, LoadedStore, Operation,
    OperationError, OperationOutput,
};

/// Runner settings fixed before a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Whether the surface offers a cancel affordance.
    pub cancel_enabled: bool,
    /// Bound on progress events queued between worker and consumer.
    pub channel_capacity: usize,
    /// How often the consumer polls the surface for a cancel click.
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cancel_enabled: false,
            channel_capacity: 64,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// The consumer-side presentation of a run. Every method is called on the
/// thread that called [`OperationRunner::run`].
pub trait ProgressSurface {
    fn open(&mut self, title: &str, cancellable: bool);
    fn set_progress(&mut self, percentage: u8);
    fn set_label(&mut self, label: &str);
    /// Polled while the run is cancellable; `true` means the user asked to
    /// stop since the last poll.
    fn cancel_requested(&mut self) -> bool;
    fn close(&mut self, code: ResultCode);
    /// Blocking error notification shown after a failed run has closed.
    fn show_error(&mut self, message: &str);
}

/// What a finished run hands back to the caller.
pub struct RunReport<B: CacheMetadata> {
    pub code: ResultCode,
    pub error: Option<String>,
    pub output: Option<OperationOutput<B>>,
}

impl<B: CacheMetadata> RunReport<B> {
    pub fn succeeded(&self) -> bool {
        self.code == ResultCode::Success
    }

    pub fn into_loaded(self) -> Option<LoadedStore<B>> {
        self.output.and_then(OperationOutput::into_loaded)
    }
}

impl<B: CacheMetadata> std::fmt::Debug for RunReport<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunReport")
            .field("code", &self.code)
            .field("error", &self.error)
            .field("output", &self.output)
            .finish()
    }
}

/// Runs operations on a worker thread while the calling thread drives a
/// [`ProgressSurface`] from the relayed events.
pub struct OperationRunner<B> {
    backend: Arc<B>,
    config: RunnerConfig,
}

impl<B: CacheMetadata> OperationRunner<B> {
    pub fn new(backend: Arc<B>, config: RunnerConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn run(&self, operation: Operation<B>, surface: &mut dyn ProgressSurface) -> RunReport<B> {
        self.run_with_token(operation, surface, CancellationToken::new())
    }

    /// Like [`run`](Self::run), with a token the caller may also request on.
    /// The token is only honoured when the run is cancellable.
    pub fn run_with_token(
        &self,
        operation: Operation<B>,
        surface: &mut dyn ProgressSurface,
        token: CancellationToken,
    ) -> RunReport<B> {
        let kind = operation.kind();
        let cancel_enabled = self.config.cancel_enabled;
        let mut consumer = Consumer {
            state: SurfaceState::new(),
            surface,
            token: token.clone(),
        };
        consumer.dispatch(Msg::Started {
            kind,
            cancel_enabled,
        });

        let (tx, rx) = mpsc::sync_channel(self.config.channel_capacity.max(1));
        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name(format!("tripleops-{kind}"))
            .spawn(move || {
                let sink = ChannelProgressSink::new(tx.clone());
                let outcome = operation.execute(
                    backend.as_ref(),
                    &sink,
                    cancel_enabled.then_some(&token),
                );
                let _ = tx.send(EngineEvent::Finished(outcome));
            });
        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                let fault = OperationError::WorkerSpawn(err.to_string());
                op_error!("{} not started: {}", kind, fault);
                return consumer.finish(Outcome::Failed(fault.to_string()));
            }
        };

        let poll = cancel_enabled.then_some(self.config.poll_interval);
        let outcome = consumer.pump(&rx, poll);
        if worker.join().is_err() {
            op_error!("worker thread for {} panicked", kind);
        }
        consumer.finish(outcome)
    }
}

struct Consumer<'s> {
    state: SurfaceState,
    surface: &'s mut dyn ProgressSurface,
    token: CancellationToken,
}

impl Consumer<'_> {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Open { title, cancellable } => self.surface.open(title, cancellable),
            Effect::SetProgress(percentage) => self.surface.set_progress(percentage),
            Effect::SetLabel(label) => self.surface.set_label(&label),
            Effect::RequestCancel => {
                op_info!("cancel requested at {}%", self.state.percentage());
                self.token.request();
            }
            Effect::Close(code) => self.surface.close(code),
            Effect::ShowError(message) => self.surface.show_error(&message),
            Effect::Fault(violation) => op_error!("progress surface fault: {}", violation),
        }
    }

    /// Drains worker events until the terminal outcome arrives. With `poll`
    /// set, the surface is checked for a cancel click between events.
    fn pump<T>(&mut self, rx: &Receiver<EngineEvent<T>>, poll: Option<Duration>) -> Outcome<T> {
        loop {
            let received = match poll {
                Some(interval) => rx.recv_timeout(interval),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(EngineEvent::Progress(event)) => self.dispatch(Msg::Progress(event)),
                Ok(EngineEvent::Finished(outcome)) => return outcome,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let fault = OperationError::ProtocolViolation(
                        "worker stopped without a terminal outcome".to_string(),
                    );
                    op_error!("{}", fault);
                    return Outcome::Failed(fault.to_string());
                }
            }
            if poll.is_some() && self.surface.cancel_requested() {
                self.dispatch(Msg::CancelClicked);
            }
        }
    }

    fn finish<B: CacheMetadata>(mut self, outcome: Outcome<OperationOutput<B>>) -> RunReport<B> {
        let code = outcome.result_code();
        let error = outcome.error_message().map(str::to_string);
        self.dispatch(Msg::Finished {
            outcome: outcome.kind(),
            error: error.clone(),
        });
        op_debug!(
            "run closed with {} after {} progress events",
            code,
            self.state.view().progress_events
        );
        let output = match outcome {
            Outcome::Succeeded(output) => Some(output),
            Outcome::Failed(_) | Outcome::Cancelled => None,
        };
        RunReport {
            code,
            error,
            output,
        }
    }
}
