//! In-memory sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cx_core::EventTime;

use crate::sink::EventSink;
use crate::{OutputError, OutputResult};

/// Collects events in a shared `Vec`.
///
/// Clones share storage, so a test can keep one handle while the Recorder
/// owns another.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    events:   Arc<Mutex<Vec<EventTime>>>,
    finished: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn events(&self) -> Vec<EventTime> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl EventSink for MemorySink {
    fn write_events(&mut self, events: &[EventTime]) -> OutputResult<()> {
        if self.is_finished() {
            return Err(OutputError::Finished);
        }
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(events);
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished.store(true, Ordering::Release);
        Ok(())
    }
}
