use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use tripleops_core::LoadStrategy;
use tripleops_engine::RunnerConfig;
use tripleops_logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "./tripleops.ron";

/// Settings read from the `ron` configuration file. Every field is optional
/// in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cancel_enabled: bool,
    pub load_strategy: LoadStrategy,
    pub channel_capacity: usize,
    pub poll_interval_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    /// Wait for Enter after printing a failure, like a modal error box.
    /// `None` pauses only when stdin is a terminal.
    pub pause_on_error: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runner = RunnerConfig::default();
        Self {
            cancel_enabled: runner.cancel_enabled,
            load_strategy: LoadStrategy::default(),
            channel_capacity: runner.channel_capacity,
            poll_interval_ms: u64::try_from(runner.poll_interval.as_millis()).unwrap_or(50),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            pause_on_error: None,
        }
    }
}

impl AppConfig {
    /// Reads `path`. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> anyhow::Result<Option<AppConfig>> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        let config: AppConfig =
            ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn level_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim()).ok()
    }

    pub fn pauses_on_error(&self, stdin_is_terminal: bool) -> bool {
        self.pause_on_error.unwrap_or(stdin_is_terminal)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            cancel_enabled: self.cancel_enabled,
            channel_capacity: self.channel_capacity.max(1),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}
