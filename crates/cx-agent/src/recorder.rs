//! The Recorder role: buffer every event, write them all at shutdown.

use tracing::{debug, info};

use cx_core::{EventTime, Payload, RECORDER, timestamp};
use cx_output::EventSink;

use crate::agent::run_blocking;
use crate::{Agent, AgentError, AgentResult, Task};

/// The recorder agent.  Events are written to `sink` once, after the agent
/// finishes, including any still queued in its mailbox at that point.
pub fn recorder(sink: Box<dyn EventSink>) -> Agent {
    Agent::new(RECORDER)
        .assign_task(Task::Record { sink })
        .assign_task(Task::SelfTerminate)
}

/// Convert a received payload into a recorded event.
///
/// Events keep their original stamp; bare values and control codes are
/// stamped on arrival.
pub fn to_event(payload: Payload) -> EventTime {
    match payload {
        Payload::Event(event) => event,
        Payload::Value(value) => timestamp(value),
        Payload::Control(code) => timestamp(i64::from(code.code())),
    }
}

pub(crate) async fn record(agent: Agent, mut sink: Box<dyn EventSink>) -> AgentResult<()> {
    let mut events = Vec::new();
    let outcome = loop {
        match agent.recv().await {
            Ok(message) => {
                debug!(from = %message.origin, payload = %message.payload, "recorded");
                events.push(to_event(message.payload));
            }
            Err(AgentError::NotWorking) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    // Events already queued when the session ended still belong to it.
    while let Some(message) = agent.mailbox().take_first(|m| !m.origin.is_observer()) {
        events.push(to_event(message.payload));
    }

    let count = events.len();
    run_blocking(move || {
        sink.write_events(&events)?;
        sink.finish()
    })
    .await??;
    info!(agent = %agent.name(), events = count, "events written");
    outcome
}
