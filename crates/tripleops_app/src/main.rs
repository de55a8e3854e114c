mod cli;
mod commands;
mod config;
mod surface;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use tripleops_core::LoadStrategy;
use tripleops_engine::{OperationRunner, PlainBackend};
use tripleops_logging::{op_info, op_warn};

use crate::cli::Cli;
use crate::commands::Session;
use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::surface::TerminalSurface;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    // Logging is configured by the file, so problems reading it are
    // reported once the logger exists.
    let (mut config, config_problem) = match AppConfig::load(&config_path) {
        Ok(Some(config)) => (config, None),
        Ok(None) if cli.config.is_some() => (
            AppConfig::default(),
            Some(format!("{} not found, using defaults", config_path.display())),
        ),
        Ok(None) => (AppConfig::default(), None),
        Err(err) => (AppConfig::default(), Some(format!("{err:#}, using defaults"))),
    };

    let level = config.level_filter();
    tripleops_logging::initialize(config.log_destination, level.unwrap_or(LevelFilter::Info));
    if let Some(problem) = config_problem {
        op_warn!("configuration: {}", problem);
    }
    if level.is_none() {
        op_warn!("unknown log level {:?}, using info", config.log_level);
    }

    if cli.cancellable {
        config.cancel_enabled = true;
    }
    if cli.materialize {
        config.load_strategy = LoadStrategy::Materialized;
    }
    op_info!("tripleops starting: {:?}", cli.command);

    let runner = OperationRunner::new(Arc::new(PlainBackend::new()), config.runner_config());
    let mut session = Session::new(
        runner,
        config.load_strategy,
        TerminalSurface::new(config.pauses_on_error(io::stdin().is_terminal())),
    );
    let code = session.execute(cli.command);
    op_info!("exiting with {}", code);
    ExitCode::from(u8::try_from(code.as_i32()).unwrap_or(1))
}
