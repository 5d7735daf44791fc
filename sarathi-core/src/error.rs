//! Error types for Sarathi

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Sarathi error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Actuator link is not open
    #[error("Actuator link not connected")]
    NotConnected,

    /// Command name outside FORWARD/LEFT/RIGHT/STOP
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// Depth buffer does not match the frame dimensions
    #[error("Invalid depth map: expected {expected} samples, got {actual}")]
    InvalidDepthMap {
        /// width * height
        expected: usize,
        /// Length of the depth buffer
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
