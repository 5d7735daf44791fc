//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level. Records emitted by
//! `sarathi-core` through the `log` facade are picked up by the subscriber's
//! log bridge.

use crate::config::LoggingConfig;
use crate::error::{NavError, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Directory receiving one file per session
    Directory(PathBuf),
}

impl LogOutput {
    pub fn parse(output: &str) -> Self {
        match output.trim() {
            "" | "stdout" => Self::Stdout,
            "stderr" => Self::Stderr,
            dir => Self::Directory(PathBuf::from(dir)),
        }
    }
}

/// Session log file name, e.g. `sarathi_nav_20250101_093000.log`
pub fn session_log_name(started: &DateTime<Local>) -> String {
    format!("sarathi_nav_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Create the session log file inside `dir`, creating the directory if needed
pub fn create_session_log(dir: &Path, started: &DateTime<Local>) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(session_log_name(started));
    let file = File::create(&path)?;
    Ok((path, file))
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| NavError::Config(format!("Invalid log level {:?}: {}", level, e))),
    }
}

/// Install the global subscriber. Returns the session log path when logging
/// to a directory.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    let filter = env_filter(&config.level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let (installed, log_path) = match LogOutput::parse(&config.output) {
        LogOutput::Stdout => (builder.try_init(), None),
        LogOutput::Stderr => (builder.with_writer(std::io::stderr).try_init(), None),
        LogOutput::Directory(dir) => {
            let (path, file) = create_session_log(&dir, &Local::now())?;
            let installed = builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            (installed, Some(path))
        }
    };

    installed.map_err(|e| NavError::Config(format!("Failed to install logger: {}", e)))?;
    Ok(log_path)
}
