//! The Reader role: device lines in, timestamped events out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cx_core::{Control, OBSERVER, READER, RECORDER, timestamp};
use cx_device::{SharedDevice, lock};

use crate::agent::run_blocking;
use crate::task::exit_ok;
use crate::{Agent, AgentError, AgentResult, Task};

/// How long one device read may block before the reader rechecks its flag.
pub const DEFAULT_POLL: Duration = Duration::from_millis(100);

/// The reader agent: reads `device` and forwards every line to the
/// recorder, stopping when the observer says so.
pub fn reader(device: SharedDevice, poll: Duration) -> Agent {
    Agent::new(READER)
        .assign_task(Task::Read { device, poll })
        .assign_task(Task::SelfTerminate)
}

pub(crate) async fn read(agent: Agent, device: SharedDevice, poll: Duration) -> AgentResult<()> {
    let result = read_loop(&agent, &device, poll).await;

    let dev = Arc::clone(&device);
    if let Err(e) = run_blocking(move || lock(&dev).cancel_read()).await? {
        warn!(error = %e, "cancel_read failed");
    }

    if let Err(AgentError::Device(e)) = &result {
        // A dead device ends the session rather than leaving it hanging.
        warn!(agent = %agent.name(), error = %e, "device failed; aborting");
        if let Err(send) = agent.send_to(OBSERVER, Control::Abend) {
            debug!(error = %send, "abort not relayed");
        }
        agent.finish();
    }
    exit_ok(result)
}

async fn read_loop(agent: &Agent, device: &SharedDevice, poll: Duration) -> AgentResult<()> {
    while agent.working() {
        let dev = Arc::clone(device);
        let Some(bytes) = agent.call_blocking(move || lock(&dev).read_line(poll)).await?? else {
            continue;
        };
        let line = String::from_utf8_lossy(&bytes).trim_end().to_owned();
        agent.send_to(RECORDER, timestamp(line))?;
    }
    Ok(())
}
