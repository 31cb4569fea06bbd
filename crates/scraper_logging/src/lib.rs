#![deny(missing_docs)]
//! Shared logging utilities for the scraper workspace.
//!
//! Library crates log through the `log` facade; this crate owns the
//! `simplelog` initialization used by the app binary and by tests.

use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

/// Initializes terminal logging for the app binary.
///
/// When `log_file` is given, messages are additionally written there at
/// debug level regardless of the terminal level.
pub fn initialize_for_app(
    level: log::LevelFilter,
    log_file: Option<&Path>,
) -> Result<(), log::SetLoggerError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        if let Ok(file) = std::fs::File::create(path) {
            loggers.push(WriteLogger::new(
                log::LevelFilter::Debug,
                Config::default(),
                file,
            ));
        }
    }

    CombinedLogger::init(loggers)
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
