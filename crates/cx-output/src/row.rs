//! Plain data row type written by output backends.

use cx_core::EventTime;

/// One recorded event, flattened for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Seconds since the session clock's anchor.
    pub time:  f64,
    /// The event value rendered as text.
    pub event: String,
}

impl From<&EventTime> for EventRow {
    fn from(e: &EventTime) -> Self {
        EventRow { time: e.time, event: e.event.to_string() }
    }
}
