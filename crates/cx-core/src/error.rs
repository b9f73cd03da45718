//! Framework error type for `cx-core`.
//!
//! Sub-crates define their own error enums (`ScheduleError`, `AgentError`,
//! ...) and wrap `CoreError` as one variant where they need it.

use thiserror::Error;

/// The error type for configuration loading and value conversion.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown control code {0}")]
    UnknownControl(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_norway::Error> for CoreError {
    fn from(e: serde_norway::Error) -> Self {
        CoreError::Parse(e.to_string())
    }
}

/// Shorthand result type for `cx-core`.
pub type CoreResult<T> = Result<T, CoreError>;
