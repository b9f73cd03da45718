use thiserror::Error;

use cx_agent::AgentError;
use cx_core::AgentName;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment configuration error: {0}")]
    Config(String),

    #[error("agent {0:?} appears more than once in the environment")]
    DuplicateAgent(AgentName),

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("environment thread {name:?} panicked: {message}")]
    ThreadPanicked { name: String, message: String },

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub type EnvResult<T> = Result<T, EnvError>;
