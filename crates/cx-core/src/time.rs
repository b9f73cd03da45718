//! Event time model.
//!
//! # Design
//!
//! Event times are `f64` seconds measured from a monotonic anchor, not wall
//! clock time.  The process-wide anchor is fixed the first time
//! [`timestamp`] is called, so every agent on every thread stamps events
//! against the same origin and times from different run groups are directly
//! comparable:
//!
//!   time = (now - anchor).as_secs_f64()
//!
//! A [`SessionClock`] carries its own anchor for callers that want times
//! relative to, say, the start of a block of trials.

use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::Value;

static PROCESS_ANCHOR: OnceLock<Instant> = OnceLock::new();

// ── EventTime ─────────────────────────────────────────────────────────────────

/// A value paired with the moment it was observed.
///
/// Immutable once created; owned by whichever agent buffers it until the
/// final flush to an event sink.
#[derive(Clone, PartialEq, Debug)]
pub struct EventTime {
    /// Seconds since the clock's anchor.
    pub time:  f64,
    pub event: Value,
}

impl EventTime {
    pub fn new(time: f64, event: impl Into<Value>) -> Self {
        Self { time, event: event.into() }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.time, self.event)
    }
}

/// Stamp `event` with the current time on the process-wide monotonic clock.
pub fn timestamp(event: impl Into<Value>) -> EventTime {
    let anchor = PROCESS_ANCHOR.get_or_init(Instant::now);
    EventTime::new(anchor.elapsed().as_secs_f64(), event)
}

// ── SessionClock ──────────────────────────────────────────────────────────────

/// A monotonic clock with its own anchor.
///
/// `SessionClock` is cheap to copy and holds no heap data.
#[derive(Copy, Clone, Debug)]
pub struct SessionClock {
    anchor: Instant,
}

impl SessionClock {
    /// Start a clock anchored at the current instant.
    pub fn start() -> Self {
        Self { anchor: Instant::now() }
    }

    /// Seconds elapsed since the anchor.
    #[inline]
    pub fn now(&self) -> f64 {
        self.anchor.elapsed().as_secs_f64()
    }

    /// Elapsed time as a `Duration`.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.anchor.elapsed()
    }

    /// Stamp `event` against this clock's anchor.
    pub fn stamp(&self, event: impl Into<Value>) -> EventTime {
        EventTime::new(self.now(), event)
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}
