use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A generator or shuffler precondition was violated.  Never retried.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("trial table parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ScheduleError {
    fn from(e: csv::Error) -> Self {
        ScheduleError::Parse(e.to_string())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Shorthand for returning `InvalidParameter` from a precondition check.
pub(crate) fn invalid<T>(msg: impl Into<String>) -> ScheduleResult<T> {
    Err(ScheduleError::InvalidParameter(msg.into()))
}
