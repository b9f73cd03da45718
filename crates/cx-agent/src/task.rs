//! Agent tasks.
//!
//! A task is one cooperative loop owned by an agent.  The built-in loops
//! cover the roles of an experiment; anything else is a [`Task::Custom`]
//! closure.  Every built-in loop has the same shape:
//!
//! ```text
//! while working:
//!     await (recv / sleep / blocking call)
//!     handle
//!     on a terminal code: finish, break
//! ```
//!
//! and treats `NotWorking` from its await as a normal exit.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use cx_device::SharedDevice;
use cx_output::EventSink;

use crate::stimulator::StimulusPlan;
use crate::{Agent, AgentResult, observer, reader, recorder, stimulator};

/// The future a task runs as.
pub type TaskFuture = Pin<Box<dyn Future<Output = AgentResult<()>> + Send>>;

/// A boxed application loop.
pub type TaskFn = Box<dyn FnOnce(Agent) -> TaskFuture + Send>;

pub enum Task {
    /// Relay the first terminal code to every agent, then finish.
    Observe,
    /// Finish when the observer relays a terminal code.
    SelfTerminate,
    /// Forward device lines to the recorder as timestamped events.
    Read { device: SharedDevice, poll: Duration },
    /// Buffer every incoming event and hand the lot to `sink` on shutdown.
    Record { sink: Box<dyn EventSink> },
    /// Deliver a planned sequence of pulses, then end the session.
    Pulse { device: SharedDevice, plan: StimulusPlan },
    Custom(TaskFn),
}

impl Task {
    /// Wrap an async closure as a task.
    pub fn custom<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Agent) -> Fut + Send + 'static,
        Fut: Future<Output = AgentResult<()>> + Send + 'static,
    {
        Task::Custom(Box::new(move |agent| Box::pin(f(agent))))
    }

    /// Short label used in logs and run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Observe        => "observe",
            Task::SelfTerminate  => "self_terminate",
            Task::Read { .. }    => "read",
            Task::Record { .. }  => "record",
            Task::Pulse { .. }   => "pulse",
            Task::Custom(_)      => "custom",
        }
    }

    /// Bind the task to `agent`, producing the future to spawn.
    pub fn into_future(self, agent: Agent) -> TaskFuture {
        match self {
            Task::Observe                => Box::pin(observer::observe(agent)),
            Task::SelfTerminate          => Box::pin(observer::self_terminate(agent)),
            Task::Read { device, poll }  => Box::pin(reader::read(agent, device, poll)),
            Task::Record { sink }        => Box::pin(recorder::record(agent, sink)),
            Task::Pulse { device, plan } => Box::pin(stimulator::pulse(agent, device, plan)),
            Task::Custom(f)              => f(agent),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task::{}", self.kind())
    }
}

/// Map the cancellation signal to a clean exit.
pub(crate) fn exit_ok(result: AgentResult<()>) -> AgentResult<()> {
    match result {
        Err(e) if e.is_not_working() => Ok(()),
        other => other,
    }
}
