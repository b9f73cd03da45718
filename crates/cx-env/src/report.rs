//! Run summaries.

use std::fmt;
use std::time::Duration;

use cx_core::AgentName;

/// How one task exited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Returned `Ok`, or stopped on `NotWorking`.
    Completed,
    /// Returned any other error.
    Failed(String),
    /// Panicked; the panic was contained to the task.
    Panicked(String),
}

/// A task exit, as reported to [`EnvObserver::on_task_end`](crate::EnvObserver::on_task_end).
#[derive(Clone, Debug)]
pub struct TaskEnd {
    pub agent:   AgentName,
    pub kind:    &'static str,
    pub outcome: TaskOutcome,
}

/// Counts returned by a finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub name:            String,
    pub tasks_spawned:   usize,
    pub tasks_completed: usize,
    pub tasks_failed:    usize,
    pub tasks_panicked:  usize,
    /// An external interrupt was escalated during the run.
    pub interrupted:     bool,
    pub elapsed:         Duration,
}

impl RunReport {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Self::default() }
    }

    pub(crate) fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed   => self.tasks_completed += 1,
            TaskOutcome::Failed(_)   => self.tasks_failed += 1,
            TaskOutcome::Panicked(_) => self.tasks_panicked += 1,
        }
    }

    /// `true` if every task completed without error or panic.
    pub fn is_clean(&self) -> bool {
        self.tasks_failed == 0 && self.tasks_panicked == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} tasks, {} completed, {} failed, {} panicked in {:.3}s",
            self.name,
            self.tasks_spawned,
            self.tasks_completed,
            self.tasks_failed,
            self.tasks_panicked,
            self.elapsed.as_secs_f64(),
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}
