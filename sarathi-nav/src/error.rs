//! Error types for SarathiNav

use thiserror::Error;

/// SarathiNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Core error: {0}")]
    Core(#[from] sarathi_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signal handler error: {0}")]
    Signal(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

impl From<ctrlc::Error> for NavError {
    fn from(e: ctrlc::Error) -> Self {
        NavError::Signal(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
