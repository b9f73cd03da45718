//! `cx-agent` — mailbox agents and the experiment roles built on them.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`agent`]      | `Agent` — name, working flag, mailbox, queued tasks         |
//! | [`mailbox`]    | `Mailbox` (`Mutex<VecDeque<Message>>` + `Notify`)           |
//! | [`register`]   | `Register` — name → mailbox routing table                   |
//! | [`task`]       | `Task` variants, `Task::custom`                             |
//! | [`observer`]   | `ObserverState`, `observer()`, the self-terminate loop      |
//! | [`reader`]     | `reader()` — device lines → recorder                        |
//! | [`recorder`]   | `recorder()` — buffer events, flush to an `EventSink`       |
//! | [`stimulator`] | `Stimulator`, `StimulusPlan`, `high_for`                    |
//! | [`error`]      | `AgentError`, `AgentResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                       |
//! |-----------|--------------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the routing table             |
//!
//! # Minimal population
//!
//! ```rust,ignore
//! use cx_agent::{Agent, Register, Task, observer};
//! use cx_core::{Control, OBSERVER};
//!
//! let sender = Agent::new("sender")
//!     .assign_task(Task::custom(|a| async move {
//!         a.send_to("receiver", 1i64)?;
//!         a.send_to(OBSERVER, Control::Nend)
//!     }))
//!     .assign_task(Task::SelfTerminate);
//! let receiver = Agent::new("receiver").assign_task(Task::SelfTerminate);
//! let agents = vec![sender, receiver, observer()];
//! Register::new(&agents)?;
//! // hand `agents` to a cx_env::Environment
//! ```

pub mod agent;
pub mod error;
pub mod mailbox;
pub mod observer;
pub mod reader;
pub mod recorder;
pub mod register;
pub mod stimulator;
pub mod task;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::Agent;
pub use error::{AgentError, AgentResult};
pub use mailbox::Mailbox;
pub use observer::{ObserverState, observer};
pub use reader::{DEFAULT_POLL, reader};
pub use recorder::recorder;
pub use register::Register;
pub use stimulator::{Stimulator, StimulusPlan, high_for};
pub use task::{Task, TaskFn, TaskFuture};
