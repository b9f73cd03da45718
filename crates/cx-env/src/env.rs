//! The `Environment` struct and its run loop.

use std::any::Any;
use std::time::Instant;

use tokio::runtime::Builder;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error, info, info_span, warn};

use cx_agent::{Agent, AgentError, AgentResult};
use cx_core::{AgentName, Control};

use crate::{EnvError, EnvObserver, EnvResult, EnvironmentBuilder, RunReport, TaskEnd, TaskOutcome};

type Joined = (AgentName, &'static str, Result<AgentResult<()>, JoinError>);

// ── Environment ───────────────────────────────────────────────────────────────

/// A set of agents driven by one cooperative scheduler.
///
/// `run` spawns every queued task of every agent onto a current-thread tokio
/// runtime and blocks until all of them have exited:
///
/// ```text
/// build runtime → spawn tasks → join in exit order → RunReport
///                                 ├─ Ok / NotWorking → completed
///                                 ├─ Err(e)          → failed (logged)
///                                 └─ panic           → panicked (logged)
/// ```
///
/// A failing or panicking task never brings down its siblings; the
/// population stops only when the observer relays a terminal code.
///
/// Several environments can run side by side (see
/// [`parallelize`](Self::parallelize)) with agents that share one
/// `Register`.
///
/// Create via [`Environment::new`] or [`EnvironmentBuilder`].
pub struct Environment {
    pub(crate) name:      String,
    pub(crate) agents:    Vec<Agent>,
    pub(crate) interrupt: Option<Agent>,
    pub(crate) observer:  Box<dyn EnvObserver>,
}

impl Environment {
    /// An environment owning `agents`, which must have distinct names.
    pub fn new(agents: Vec<Agent>) -> EnvResult<Self> {
        EnvironmentBuilder::new().agents(agents).build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run every task to completion on a fresh current-thread runtime.
    ///
    /// Tasks are taken from their agents, so a second call only runs tasks
    /// assigned since the first.
    pub fn run(&mut self) -> EnvResult<RunReport> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let span = info_span!("cx_env", env = %self.name);
        runtime.block_on(self.drive().instrument(span))
    }

    /// Like [`run`](Self::run), and escalate the first Ctrl-C into an
    /// `Abend` broadcast from `observer`.
    pub fn run_with_interrupt(&mut self, observer: &Agent) -> EnvResult<RunReport> {
        self.interrupt = Some(observer.clone());
        self.run()
    }

    /// Move the run onto a dedicated OS thread.
    pub fn parallelize(self) -> EnvResult<ParallelHandle> {
        let name = self.name.clone();
        let mut env = self;
        let handle = std::thread::Builder::new()
            .name(format!("cx-env-{name}"))
            .spawn(move || env.run())?;
        Ok(ParallelHandle::from_parts(name, handle))
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    async fn drive(&mut self) -> EnvResult<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new(&self.name);
        let mut set: JoinSet<Joined> = JoinSet::new();

        for agent in &self.agents {
            for task in agent.take_tasks() {
                let name = agent.name().clone();
                let kind = task.kind();
                let inner = tokio::spawn(task.into_future(agent.clone()));
                // The wrapper outlives a panic in `inner` and keeps its identity.
                set.spawn(async move { (name, kind, inner.await) });
                report.tasks_spawned += 1;
            }
        }
        info!(agents = self.agents.len(), tasks = report.tasks_spawned, "run started");
        self.observer.on_run_start(&self.name, report.tasks_spawned);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let listen = self.interrupt.is_some();

        loop {
            tokio::select! {
                joined = set.join_next() => {
                    let Some(joined) = joined else { break };
                    let end = match joined {
                        Ok((agent, kind, result)) => task_end(agent, kind, result),
                        Err(e) => {
                            error!(error = %e, "task wrapper failed");
                            report.record(&TaskOutcome::Failed(e.to_string()));
                            continue;
                        }
                    };
                    report.record(&end.outcome);
                    self.observer.on_task_end(&self.name, &end);
                }
                signal = &mut ctrl_c, if listen && !report.interrupted => {
                    report.interrupted = true;
                    if let Err(e) = signal {
                        warn!(error = %e, "interrupt listener failed");
                        continue;
                    }
                    warn!("interrupted; aborting session");
                    if let Some(observer) = &self.interrupt {
                        escalate_abort(observer);
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(%report, "run finished");
        self.observer.on_run_end(&report);
        Ok(report)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("agents", &self.agents)
            .finish_non_exhaustive()
    }
}

/// Classify and log one task exit.
fn task_end(agent: AgentName, kind: &'static str, result: Result<AgentResult<()>, JoinError>) -> TaskEnd {
    let outcome = match result {
        Ok(Ok(())) | Ok(Err(AgentError::NotWorking)) => {
            debug!(%agent, kind, "task completed");
            TaskOutcome::Completed
        }
        Ok(Err(e)) => {
            warn!(%agent, kind, error = %e, "task failed");
            TaskOutcome::Failed(e.to_string())
        }
        Err(e) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            error!(%agent, kind, panic = %message, "task panicked");
            TaskOutcome::Panicked(message)
        }
        Err(e) => {
            warn!(%agent, kind, error = %e, "task cancelled");
            TaskOutcome::Failed(e.to_string())
        }
    };
    TaskEnd { agent, kind, outcome }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "non-string panic payload".to_owned(), |s| (*s).to_owned()),
    }
}

// ── Interrupt escalation ──────────────────────────────────────────────────────

/// Turn an external interrupt into a session-wide abort.
///
/// `observer` broadcasts `Abend` to every registered agent and finishes, so
/// every self-terminate task stops its agent and the Recorder still flushes.
/// Returns `false` if the observer had already stopped.
pub fn escalate_abort(observer: &Agent) -> bool {
    match observer.send_all(Control::Abend) {
        Ok(()) => {
            observer.finish();
            true
        }
        Err(e) => {
            debug!(error = %e, "abort not broadcast");
            false
        }
    }
}

// ── ParallelHandle ────────────────────────────────────────────────────────────

/// An environment running on its own thread.
pub struct ParallelHandle {
    name:   String,
    handle: std::thread::JoinHandle<EnvResult<RunReport>>,
}

impl ParallelHandle {
    pub(crate) fn from_parts(name: String, handle: std::thread::JoinHandle<EnvResult<RunReport>>) -> Self {
        Self { name, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the environment's run returns.
    pub fn join(self) -> EnvResult<RunReport> {
        let name = self.name;
        self.handle.join().map_err(|payload| EnvError::ThreadPanicked {
            name,
            message: panic_message(payload),
        })?
    }
}
