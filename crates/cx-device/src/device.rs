//! The `Device` trait.
//!
//! # Pluggability
//!
//! The Reader and Stimulator agents talk to hardware only through [`Device`],
//! so a serial microcontroller, a capture-file replay, or a scripted fake all
//! plug in the same way.  Drivers for real boards live outside this
//! workspace.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::DeviceResult;

// ── Level ─────────────────────────────────────────────────────────────────────

/// Logic level of a digital pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low  => f.write_str("LOW"),
            Level::High => f.write_str("HIGH"),
        }
    }
}

// ── Device trait ──────────────────────────────────────────────────────────────

/// A line-oriented device with digital outputs.
///
/// # Thread safety
///
/// Implementations must be `Send` so the blocking pool can borrow them.
pub trait Device: Send {
    /// Wait up to `timeout` for one line of input.
    ///
    /// Returns the line without its terminator, or `None` if nothing arrived
    /// in time.
    fn read_line(&mut self, timeout: Duration) -> DeviceResult<Option<Vec<u8>>>;

    /// Drive `pin` to `level`.
    fn digital_write(&mut self, pin: u8, level: Level) -> DeviceResult<()>;

    /// Abort any read in progress.  Called once when the reading agent shuts
    /// down.
    fn cancel_read(&mut self) -> DeviceResult<()> {
        Ok(())
    }
}

// ── Sharing ───────────────────────────────────────────────────────────────────

/// A device handle that can cross into the blocking pool.
pub type SharedDevice = Arc<Mutex<dyn Device>>;

/// Wrap a device for use by an agent.
pub fn share<D: Device + 'static>(device: D) -> SharedDevice {
    Arc::new(Mutex::new(device))
}

/// Lock a shared device.
///
/// A panic while the lock was held leaves the device usable; the next caller
/// simply takes over the guard.
pub fn lock(device: &SharedDevice) -> MutexGuard<'_, dyn Device + 'static> {
    device.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
