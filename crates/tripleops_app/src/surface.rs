use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use signal_hook::consts::SIGINT;
use signal_hook::SigId;
use tripleops_core::ResultCode;
use tripleops_engine::ProgressSurface;
use tripleops_logging::{op_debug, op_warn};

/// Progress bar on stderr. When the run is cancellable, Ctrl-C is captured
/// and acts as the cancel button instead of killing the process.
pub struct TerminalSurface {
    bar: Option<ProgressBar>,
    interrupt: Arc<AtomicBool>,
    signal: Option<SigId>,
    pause_on_error: bool,
}

impl TerminalSurface {
    pub fn new(pause_on_error: bool) -> Self {
        Self {
            bar: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            signal: None,
            pause_on_error,
        }
    }

    fn release_signal(&mut self) {
        if let Some(id) = self.signal.take() {
            signal_hook::low_level::unregister(id);
        }
        self.interrupt.store(false, Ordering::SeqCst);
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.release_signal();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}")
        .map(|style| style.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressSurface for TerminalSurface {
    fn open(&mut self, title: &str, cancellable: bool) {
        let bar = ProgressBar::new(100);
        bar.set_style(bar_style());
        bar.set_prefix(title.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        self.release_signal();
        if cancellable {
            match signal_hook::flag::register(SIGINT, Arc::clone(&self.interrupt)) {
                Ok(id) => {
                    self.signal = Some(id);
                    bar.println("press Ctrl-C to cancel");
                }
                Err(err) => op_warn!("cancel unavailable, could not hook Ctrl-C: {}", err),
            }
        }
        self.bar = Some(bar);
    }

    fn set_progress(&mut self, percentage: u8) {
        if let Some(bar) = &self.bar {
            bar.set_position(u64::from(percentage));
        }
    }

    fn set_label(&mut self, label: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(label.to_string());
        }
    }

    fn cancel_requested(&mut self) -> bool {
        let requested = self.interrupt.swap(false, Ordering::SeqCst);
        if requested {
            op_debug!("Ctrl-C received");
            if let Some(bar) = &self.bar {
                bar.set_message("cancelling...");
            }
        }
        requested
    }

    fn close(&mut self, code: ResultCode) {
        self.release_signal();
        if let Some(bar) = self.bar.take() {
            match code {
                ResultCode::Success => bar.finish_with_message("done"),
                ResultCode::Cancelled => bar.abandon_with_message("cancelled"),
                ResultCode::Failure => bar.abandon_with_message("failed"),
            }
        }
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
        if self.pause_on_error {
            eprint!("press Enter to continue");
            let _ = io::stderr().flush();
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
        }
    }
}
