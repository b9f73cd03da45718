//! The `EventSink` trait implemented by all backends.

use cx_core::EventTime;

use crate::OutputResult;

/// Destination for a session's recorded events.
///
/// `Send` so the Recorder can move its sink into the blocking pool for the
/// final flush.
pub trait EventSink: Send {
    /// Append a batch of events, in order.
    ///
    /// Fails with [`OutputError::Finished`](crate::OutputError::Finished)
    /// after [`finish`](Self::finish).
    fn write_events(&mut self, events: &[EventTime]) -> OutputResult<()>;

    /// Flush and close the underlying resource.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn write_events(&mut self, events: &[EventTime]) -> OutputResult<()> {
        (**self).write_events(events)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}
