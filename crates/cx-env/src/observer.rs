//! Environment observer trait for progress reporting.

use crate::{RunReport, TaskEnd};

/// Callbacks invoked by [`Environment::run`][crate::Environment::run] as the
/// population starts and its tasks exit.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  `Send` so an observer can travel with
/// its environment onto a parallel thread.
///
/// # Example — task exit printer
///
/// ```rust,ignore
/// struct ExitPrinter;
///
/// impl EnvObserver for ExitPrinter {
///     fn on_task_end(&mut self, env: &str, end: &TaskEnd) {
///         println!("[{env}] {}:{} {:?}", end.agent, end.kind, end.outcome);
///     }
/// }
/// ```
pub trait EnvObserver: Send {
    /// Called once every task has been spawned.
    fn on_run_start(&mut self, _env: &str, _tasks: usize) {}

    /// Called as each task exits, in exit order.
    fn on_task_end(&mut self, _env: &str, _end: &TaskEnd) {}

    /// Called once after the last task has exited.
    fn on_run_end(&mut self, _report: &RunReport) {}
}

/// An [`EnvObserver`] that does nothing.
pub struct NoopObserver;

impl EnvObserver for NoopObserver {}
