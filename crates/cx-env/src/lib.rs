//! `cx-env` — run agent populations to completion.
//!
//! # Execution modes
//!
//! ```text
//! run()          every task of every agent on one current-thread scheduler,
//!                in the calling thread; returns when all tasks have exited.
//! parallelize()  the same run on a dedicated OS thread; join() blocks until
//!                that thread's scheduler drains.
//! ```
//!
//! Environments running in parallel exchange messages only through agent
//! mailboxes.  A task error or panic is contained to that task and counted in
//! the [`RunReport`]; stopping the whole population is the observer's job.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`env`]      | `Environment`, `ParallelHandle`, `escalate_abort`         |
//! | [`builder`]  | `EnvironmentBuilder`                                      |
//! | [`report`]   | `RunReport`, `TaskEnd`, `TaskOutcome`                     |
//! | [`observer`] | `EnvObserver` hooks, `NoopObserver`                       |
//! | [`error`]    | `EnvError`, `EnvResult<T>`                                |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                    |
//! |-----------|-----------------------------------------------------------|
//! | `fx-hash` | Forwards to `cx-agent/fx-hash`.                           |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cx_agent::{Agent, Task, observer};
//! use cx_env::Environment;
//!
//! let sender = Agent::new("sender").assign_task(send_task).assign_task(Task::SelfTerminate);
//! let receiver = Agent::new("receiver").assign_task(recv_task).assign_task(Task::SelfTerminate);
//!
//! let mut env = Environment::new(vec![sender, receiver, observer()])?;
//! let report = env.run()?;
//! assert!(report.is_clean());
//! ```

pub mod builder;
pub mod env;
pub mod error;
pub mod observer;
pub mod report;

#[cfg(test)]
mod tests;

pub use builder::EnvironmentBuilder;
pub use env::{Environment, ParallelHandle, escalate_abort};
pub use error::{EnvError, EnvResult};
pub use observer::{EnvObserver, NoopObserver};
pub use report::{RunReport, TaskEnd, TaskOutcome};
