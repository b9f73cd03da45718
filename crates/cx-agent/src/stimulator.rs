//! The Stimulator role: timed pulses on digital output pins.
//!
//! A [`StimulusPlan`] is the schedule side of an experiment turned into
//! hardware actions:
//!
//! ```text
//! for interval in intervals:
//!     sleep(interval)
//!     pin HIGH ─ pulse ─ LOW          (event "pulse <pin>" → recorder)
//! send Nend → observer                (if end_session)
//! ```
//!
//! Pin writes go through the blocking pool.  The LOW write of a pulse is
//! issued even if the agent finishes mid-pulse, so an output never stays
//! high after shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use cx_core::{Control, OBSERVER, RECORDER, STIMULATOR, timestamp};
use cx_device::{Level, SharedDevice, lock};

use crate::agent::run_blocking;
use crate::task::exit_ok;
use crate::{Agent, AgentError, AgentResult, Task};

// ── StimulusPlan ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct StimulusPlan {
    pub pin:         u8,
    /// How long the pin stays high per pulse.
    pub pulse:       Duration,
    /// Seconds to wait before each pulse.
    pub intervals:   Vec<f64>,
    /// Send `Nend` to the observer after the last pulse.
    pub end_session: bool,
}

impl StimulusPlan {
    pub fn new(pin: u8, pulse: Duration, intervals: Vec<f64>) -> Self {
        Self { pin, pulse, intervals, end_session: true }
    }

    /// Keep the session running after the last pulse.
    pub fn open_ended(mut self) -> Self {
        self.end_session = false;
        self
    }

    /// Total planned duration, pulses included.  Saturates at
    /// `Duration::MAX`; negative intervals count as zero.
    pub fn duration(&self) -> Duration {
        let waits: f64 = self.intervals.iter().map(|w| w.max(0.0)).sum();
        let pulses = self.pulse.as_secs_f64() * self.intervals.len() as f64;
        Duration::try_from_secs_f64(waits + pulses).unwrap_or(Duration::MAX)
    }
}

// ── Stimulator ────────────────────────────────────────────────────────────────

/// The stimulator agent together with the device it drives.
pub struct Stimulator {
    agent:  Agent,
    device: SharedDevice,
}

impl Stimulator {
    /// A stimulator that stops when the observer says so.
    pub fn new(device: SharedDevice) -> Self {
        let agent = Agent::new(STIMULATOR).assign_task(Task::SelfTerminate);
        Self { agent, device }
    }

    /// Run `plan` as one of the agent's tasks.
    pub fn with_plan(self, plan: StimulusPlan) -> Self {
        let device = Arc::clone(&self.device);
        Self { agent: self.agent.assign_task(Task::Pulse { device, plan }), device: self.device }
    }

    /// Add any other task, e.g. a custom stimulus loop built on
    /// [`high_for`].
    pub fn with_task(self, task: Task) -> Self {
        Self { agent: self.agent.assign_task(task), device: self.device }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn into_agent(self) -> Agent {
        self.agent
    }

    /// Set `pin` high for `duration`.
    pub async fn high_for(&self, pin: u8, duration: Duration) -> AgentResult<()> {
        high_for(&self.agent, &self.device, pin, duration).await
    }
}

/// Drive `pin` high for `duration` on behalf of `agent`.
///
/// Fails with `NotWorking` if the agent finishes first.  Once the HIGH
/// write has been issued the LOW write always follows, even when the agent
/// finishes during the HIGH write itself.
pub async fn high_for(
    agent: &Agent,
    device: &SharedDevice,
    pin: u8,
    duration: Duration,
) -> AgentResult<()> {
    agent.ensure_working()?;
    let dev = Arc::clone(device);
    run_blocking(move || lock(&dev).digital_write(pin, Level::High)).await??;

    let held = agent.sleep(duration).await;

    let dev = Arc::clone(device);
    run_blocking(move || lock(&dev).digital_write(pin, Level::Low)).await??;
    held
}

pub(crate) async fn pulse(agent: Agent, device: SharedDevice, plan: StimulusPlan) -> AgentResult<()> {
    exit_ok(pulse_loop(&agent, &device, &plan).await)
}

async fn pulse_loop(agent: &Agent, device: &SharedDevice, plan: &StimulusPlan) -> AgentResult<()> {
    let log_pulses = agent.register().is_some_and(|r| r.contains(RECORDER));
    info!(pin = plan.pin, pulses = plan.intervals.len(), "stimulus plan started");

    for (i, &wait) in plan.intervals.iter().enumerate() {
        let wait = Duration::try_from_secs_f64(wait).map_err(|_| AgentError::InvalidDuration(wait))?;
        agent.sleep(wait).await?;
        if log_pulses {
            agent.send_to(RECORDER, timestamp(format!("pulse {}", plan.pin)))?;
        }
        high_for(agent, device, plan.pin, plan.pulse).await?;
        debug!(trial = i, pin = plan.pin, "pulse delivered");
    }

    info!(pin = plan.pin, "stimulus plan complete");
    if plan.end_session {
        agent.send_to(OBSERVER, Control::Nend)?;
    }
    Ok(())
}
