//! Agent error type.

use thiserror::Error;

use cx_core::AgentName;
use cx_device::DeviceError;
use cx_output::OutputError;

/// Errors produced by agents and their tasks.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent has finished.  Tasks treat this as a normal exit signal.
    #[error("agent is not working")]
    NotWorking,

    #[error("no agent named {0:?} in the register")]
    UnknownAgent(AgentName),

    #[error("agent {0:?} has not been registered")]
    Unregistered(AgentName),

    #[error("agent {0:?} is already registered")]
    AlreadyRegistered(AgentName),

    #[error("duplicate agent name {0:?}")]
    DuplicateName(AgentName),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// A wait given in seconds that is negative, NaN or too large.
    #[error("invalid wait of {0} s")]
    InvalidDuration(f64),

    /// A closure passed to `call_blocking` panicked or was cancelled.
    #[error("blocking call failed: {0}")]
    Blocking(String),
}

impl AgentError {
    /// `true` for the cancellation signal.
    #[inline]
    pub fn is_not_working(&self) -> bool {
        matches!(self, AgentError::NotWorking)
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
