//! A device that replays a fixed script.
//!
//! Used by tests and demos in place of hardware.  Each call to `read_line`
//! consumes one [`ScriptStep`]; once the script is exhausted the device goes
//! quiet and every read waits out its full timeout.  Writes are appended to a
//! [`WriteLog`] that the caller can inspect after the device has been moved
//! into an agent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{Device, DeviceError, DeviceResult, Level};

/// One scripted response to `read_line`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptStep {
    /// Return this line.
    Line(Vec<u8>),
    /// Wait out the read timeout and return nothing.
    Silence,
    /// Fail with `DeviceError::Failure`.
    Fail(String),
}

impl ScriptStep {
    pub fn line(text: impl AsRef<[u8]>) -> Self {
        ScriptStep::Line(text.as_ref().to_vec())
    }
}

// ── WriteLog ──────────────────────────────────────────────────────────────────

/// Shared record of `digital_write` calls, oldest first.
#[derive(Clone, Debug, Default)]
pub struct WriteLog(Arc<Mutex<Vec<(u8, Level, Instant)>>>);

impl WriteLog {
    fn push(&self, pin: u8, level: Level) {
        let mut log = self.0.lock().unwrap_or_else(|p| p.into_inner());
        log.push((pin, level, Instant::now()));
    }

    /// `(pin, level)` pairs in call order.
    pub fn writes(&self) -> Vec<(u8, Level)> {
        let log = self.0.lock().unwrap_or_else(|p| p.into_inner());
        log.iter().map(|&(pin, level, _)| (pin, level)).collect()
    }

    /// `(pin, level, when)` triples in call order.
    pub fn timed_writes(&self) -> Vec<(u8, Level, Instant)> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── ScriptedDevice ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ScriptedDevice {
    script:      VecDeque<ScriptStep>,
    /// Delay before each scripted line is delivered.
    line_delay:  Duration,
    /// How long each pin write blocks.
    write_delay: Duration,
    writes:      WriteLog,
    cancelled:   Arc<AtomicBool>,
}

impl ScriptedDevice {
    pub fn new(script: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self { script: script.into_iter().collect(), ..Self::default() }
    }

    /// A device that delivers each text line in turn.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::new(lines.into_iter().map(ScriptStep::line))
    }

    /// A device with nothing to say.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Deliver each line only after `delay` has passed.  The delay is capped
    /// by the read timeout; a line that would arrive later is held for the
    /// next read.
    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }

    /// Block for `delay` on every pin write before logging it.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Handle to the write log; stays valid after the device is shared.
    pub fn write_log(&self) -> WriteLog {
        self.writes.clone()
    }

    /// Flag set once `cancel_read` has been called.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Device for ScriptedDevice {
    fn read_line(&mut self, timeout: Duration) -> DeviceResult<Option<Vec<u8>>> {
        if self.cancelled.load(Ordering::Acquire) {
            return Ok(None);
        }
        match self.script.pop_front() {
            Some(ScriptStep::Line(line)) => {
                if self.line_delay > timeout {
                    std::thread::sleep(timeout);
                    self.script.push_front(ScriptStep::Line(line));
                    return Ok(None);
                }
                std::thread::sleep(self.line_delay);
                Ok(Some(line))
            }
            Some(ScriptStep::Fail(reason)) => Err(DeviceError::Failure(reason)),
            Some(ScriptStep::Silence) | None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn digital_write(&mut self, pin: u8, level: Level) -> DeviceResult<()> {
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        self.writes.push(pin, level);
        Ok(())
    }

    fn cancel_read(&mut self) -> DeviceResult<()> {
        self.cancelled.store(true, Ordering::Release);
        Ok(())
    }
}
