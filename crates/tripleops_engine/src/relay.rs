use std::sync::mpsc::SyncSender;

use tripleops_core::{ProgressEvent, ProgressRangeMapper};
use tripleops_logging::op_trace;

use crate::{CancellationToken, EngineEvent, Interrupted, ProgressListener};

/// Where the worker side delivers remapped progress.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

pub struct ChannelProgressSink<T> {
    tx: SyncSender<EngineEvent<T>>,
}

impl<T> ChannelProgressSink<T> {
    pub fn new(tx: SyncSender<EngineEvent<T>>) -> Self {
        Self { tx }
    }
}

impl<T: Send> ProgressSink for ChannelProgressSink<T> {
    fn emit(&self, event: ProgressEvent) {
        // A vanished consumer is not the worker's problem; the run still
        // finishes and its outcome is dropped.
        let _ = self.tx.send(EngineEvent::Progress(event));
    }
}

/// Worker-side gate in front of a [`ProgressSink`]: holds regressions at the
/// high-water mark and drops exact repeats, so the consumer only ever sees a
/// non-decreasing sequence.
///
/// A label change at an unchanged percentage is still forwarded. Strict
/// increase holds only for what the surface is told to draw: the consumer's
/// `update` turns such an event into `SetLabel` alone.
pub struct ProgressRelay<'a> {
    sink: &'a dyn ProgressSink,
    last: Option<ProgressEvent>,
}

impl<'a> ProgressRelay<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, last: None }
    }

    pub fn last(&self) -> Option<&ProgressEvent> {
        self.last.as_ref()
    }

    pub fn relay(&mut self, event: ProgressEvent) {
        let floor = self.last.as_ref().map_or(0, |last| last.percentage);
        let event = ProgressEvent {
            percentage: event.percentage.max(floor),
            label: event.label,
        };
        if self.last.as_ref() == Some(&event) {
            return;
        }
        self.sink.emit(event.clone());
        self.last = Some(event);
    }

    /// Emits a final 100% tick unless the last event already read 100.
    pub fn complete(&mut self, label: &str) {
        if self.last.as_ref().map_or(true, |last| last.percentage < 100) {
            self.relay(ProgressEvent::new(100, label));
        }
    }
}

/// The listener handed to the collaborator for one phase: every callback is
/// a cancellation checkpoint, then a remap onto the phase's slot.
pub(crate) struct Checkpoint<'r, 'a> {
    mapper: ProgressRangeMapper,
    relay: &'r mut ProgressRelay<'a>,
    cancel: Option<&'r CancellationToken>,
    interrupted: bool,
}

impl<'r, 'a> Checkpoint<'r, 'a> {
    pub(crate) fn new(
        mapper: ProgressRangeMapper,
        relay: &'r mut ProgressRelay<'a>,
        cancel: Option<&'r CancellationToken>,
    ) -> Self {
        Self {
            mapper,
            relay,
            cancel,
            interrupted: false,
        }
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.interrupted
    }
}

impl ProgressListener for Checkpoint<'_, '_> {
    fn notify_progress(&mut self, level: f32, section: &str) -> Result<(), Interrupted> {
        if self.interrupted || self.cancel.is_some_and(CancellationToken::is_requested) {
            if !self.interrupted {
                op_trace!("checkpoint in phase {:?} observed cancellation", self.mapper.phase());
            }
            self.interrupted = true;
            return Err(Interrupted);
        }
        self.relay.relay(self.mapper.remap(level, section));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tripleops_core::RangeMapping;

    use super::*;

    #[derive(Default)]
    struct VecSink(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for VecSink {
        fn emit(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn percentages(sink: &VecSink) -> Vec<u8> {
        sink.0.lock().unwrap().iter().map(|e| e.percentage).collect()
    }

    #[test]
    fn relay_holds_regressions_and_drops_repeats() {
        let sink = VecSink::default();
        let mut relay = ProgressRelay::new(&sink);
        relay.relay(ProgressEvent::new(10, "a"));
        relay.relay(ProgressEvent::new(10, "a"));
        relay.relay(ProgressEvent::new(5, "a"));
        relay.relay(ProgressEvent::new(5, "b"));
        relay.relay(ProgressEvent::new(20, "b"));

        assert_eq!(percentages(&sink), vec![10, 10, 20]);
        assert_eq!(sink.0.lock().unwrap()[1].label, "b");
    }

    #[test]
    fn complete_only_ticks_when_short_of_100() {
        let sink = VecSink::default();
        let mut relay = ProgressRelay::new(&sink);
        relay.complete("done");
        relay.complete("done");
        assert_eq!(percentages(&sink), vec![100]);
    }

    #[test]
    fn checkpoint_refuses_once_cancel_is_requested() {
        let sink = VecSink::default();
        let token = CancellationToken::new();
        let mut relay = ProgressRelay::new(&sink);
        let mapper = ProgressRangeMapper::new(RangeMapping::spanning(0, 50), "phase");
        let mut checkpoint = Checkpoint::new(mapper, &mut relay, Some(&token));

        assert_eq!(checkpoint.notify_progress(50.0, ""), Ok(()));
        token.request();
        assert_eq!(checkpoint.notify_progress(60.0, ""), Err(Interrupted));
        assert_eq!(checkpoint.notify_progress(70.0, ""), Err(Interrupted));
        assert!(checkpoint.interrupted());
        assert_eq!(percentages(&sink), vec![25]);
    }

    #[test]
    fn checkpoint_without_token_never_interrupts() {
        let sink = VecSink::default();
        let mut relay = ProgressRelay::new(&sink);
        let mapper = ProgressRangeMapper::new(RangeMapping::FULL, "phase");
        let mut checkpoint = Checkpoint::new(mapper, &mut relay, None);
        assert_eq!(checkpoint.notify_progress(100.0, "x"), Ok(()));
        assert!(!checkpoint.interrupted());
    }
}
