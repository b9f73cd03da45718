//! Device error type.

use thiserror::Error;

/// Errors produced by a device driver.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device disconnected")]
    Disconnected,

    /// A failure reported by the driver itself.
    #[error("device failure: {0}")]
    Failure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DeviceResult<T> = Result<T, DeviceError>;
