//! The termination protocol.
//!
//! # State machine
//!
//! ```text
//!              Start / values                 send_all + finish
//!   Listening ───────────────► Listening
//!   Listening ── Nend|Abend ─► Broadcasting(code) ───────────────► Stopped
//! ```
//!
//! The observer relays the *first* terminal code it receives to every other
//! registered agent and finishes.  Each role agent runs a self-terminate
//! task that waits for that relay and finishes its own agent, so sibling
//! tasks notice at their next suspension point.
//!
//! Mailbox waits and sleeps wake as soon as the flag drops.  A reader is
//! inside a blocking device read and notices within one poll timeout, so a
//! session stops at most one poll after the terminal code arrives.

use tracing::{debug, info};

use cx_core::{Control, OBSERVER, Payload};

use crate::task::exit_ok;
use crate::{Agent, AgentResult, Task};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObserverState {
    Listening,
    Broadcasting(Control),
    Stopped,
}

impl ObserverState {
    /// Transition on an incoming payload.
    pub fn on_payload(self, payload: &Payload) -> Self {
        match (self, payload.control()) {
            (ObserverState::Listening, Some(code)) if code.is_terminal() => {
                ObserverState::Broadcasting(code)
            }
            (state, _) => state,
        }
    }

    /// Transition once the broadcast has been sent.
    pub fn broadcast_sent(self) -> Self {
        match self {
            ObserverState::Broadcasting(_) => ObserverState::Stopped,
            state => state,
        }
    }

    /// The code to broadcast, if one is pending.
    pub fn pending(self) -> Option<Control> {
        match self {
            ObserverState::Broadcasting(code) => Some(code),
            _ => None,
        }
    }
}

/// The observer agent.
pub fn observer() -> Agent {
    Agent::new(OBSERVER).assign_task(Task::Observe)
}

pub(crate) async fn observe(agent: Agent) -> AgentResult<()> {
    exit_ok(observe_loop(&agent).await)
}

async fn observe_loop(agent: &Agent) -> AgentResult<()> {
    let mut state = ObserverState::Listening;
    while agent.working() {
        let message = agent.recv().await?;
        debug!(from = %message.origin, payload = %message.payload, "observer received");
        state = state.on_payload(&message.payload);

        if let Some(code) = state.pending() {
            info!(%code, from = %message.origin, "relaying termination");
            agent.send_all(code)?;
            agent.finish();
            state = state.broadcast_sent();
        }
    }
    Ok(())
}

pub(crate) async fn self_terminate(agent: Agent) -> AgentResult<()> {
    exit_ok(self_terminate_loop(&agent).await)
}

async fn self_terminate_loop(agent: &Agent) -> AgentResult<()> {
    while agent.working() {
        let message = agent.recv_from(OBSERVER).await?;
        if message.payload.is_terminal() {
            debug!(agent = %agent.name(), payload = %message.payload, "terminating");
            agent.finish();
            break;
        }
    }
    Ok(())
}
