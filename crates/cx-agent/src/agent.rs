//! The `Agent` handle.
//!
//! # Lifecycle
//!
//! ```text
//! Agent::new(name)            working = true, no tasks, unregistered
//!   .assign_task(..)          tasks queued in assignment order
//! Register::new(&agents)      mailbox reachable by name
//! Environment::run            tasks taken and spawned
//! finish()                    working = false, every waiter woken
//! ```
//!
//! `Agent` is a cheap `Arc` handle; every task of an agent holds a clone.
//! Once `working` is false, outbound sends fail and every suspension point
//! (`recv*`, `sleep`, `call_blocking`) returns [`AgentError::NotWorking`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use cx_core::{AgentName, Message, Payload};

use crate::{AgentError, AgentResult, Mailbox, Register, Task};

struct AgentInner {
    name:     AgentName,
    working:  AtomicBool,
    mailbox:  Arc<Mailbox>,
    tasks:    Mutex<Vec<Task>>,
    register: OnceLock<Register>,
}

#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    pub fn new(name: impl Into<AgentName>) -> Self {
        Agent {
            inner: Arc::new(AgentInner {
                name:     name.into(),
                working:  AtomicBool::new(true),
                mailbox:  Arc::new(Mailbox::new()),
                tasks:    Mutex::new(Vec::new()),
                register: OnceLock::new(),
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &AgentName {
        &self.inner.name
    }

    #[inline]
    pub fn working(&self) -> bool {
        self.inner.working.load(Ordering::Acquire)
    }

    /// Stop the agent.  Idempotent.
    pub fn finish(&self) {
        if self.inner.working.swap(false, Ordering::AcqRel) {
            debug!(agent = %self.name(), "finished");
        }
        self.inner.mailbox.wake_all();
    }

    /// Queue `task` to run when the agent's environment starts.
    pub fn assign_task(self, task: Task) -> Self {
        self.lock_tasks().push(task);
        self
    }

    /// Number of tasks assigned and not yet taken by an environment.
    pub fn task_count(&self) -> usize {
        self.lock_tasks().len()
    }

    /// Remove every queued task, in assignment order.
    pub fn take_tasks(&self) -> Vec<Task> {
        std::mem::take(&mut *self.lock_tasks())
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.inner.mailbox
    }

    pub fn register(&self) -> Option<&Register> {
        self.inner.register.get()
    }

    /// `true` if both handles refer to the same agent.
    pub fn ptr_eq(&self, other: &Agent) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn bind(&self, register: Register) -> AgentResult<()> {
        self.inner
            .register
            .set(register)
            .map_err(|_| AgentError::AlreadyRegistered(self.name().clone()))
    }

    // ── Sending ───────────────────────────────────────────────────────────

    /// Enqueue `payload` in `target`'s mailbox.
    pub fn send_to(&self, target: &str, payload: impl Into<Payload>) -> AgentResult<()> {
        self.ensure_working()?;
        let register = self.registered()?;
        let message = Message::new(self.name().clone(), payload);
        debug!(from = %self.name(), to = target, payload = %message.payload, "send");
        register.deliver(target, message)
    }

    /// Send `payload` to every other registered agent.
    pub fn send_all(&self, payload: impl Into<Payload>) -> AgentResult<()> {
        self.ensure_working()?;
        let register = self.registered()?;
        let message = Message::new(self.name().clone(), payload);
        debug!(from = %self.name(), payload = %message.payload, "broadcast");
        register.deliver_all(self.name().as_str(), &message);
        Ok(())
    }

    // ── Receiving ─────────────────────────────────────────────────────────

    /// Wait for the oldest message that did not come from the observer.
    ///
    /// Observer messages are left for [`recv_from`](Self::recv_from), so an
    /// application loop and the self-terminate task can share one mailbox.
    pub async fn recv(&self) -> AgentResult<Message> {
        self.wait_for(|m| !m.origin.is_observer()).await
    }

    /// Wait for the oldest message from `origin`.
    pub async fn recv_from(&self, origin: &str) -> AgentResult<Message> {
        self.wait_for(|m| m.origin == *origin).await
    }

    /// Like [`recv`](Self::recv), giving up after `timeout`.
    pub async fn try_recv(&self, timeout: Duration) -> AgentResult<Option<Message>> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(received) => received.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn wait_for<F>(&self, pred: F) -> AgentResult<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let mailbox = self.mailbox();
        loop {
            let notified = mailbox.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            self.ensure_working()?;
            if let Some(message) = mailbox.take_first(&pred) {
                return Ok(message);
            }
            notified.await;
        }
    }

    // ── Waiting ───────────────────────────────────────────────────────────

    /// Sleep for `duration`, waking early with `NotWorking` if the agent
    /// finishes.  A duration past the clock's range sleeps until finished.
    pub async fn sleep(&self, duration: Duration) -> AgentResult<()> {
        let deadline = Instant::now().checked_add(duration);
        let mailbox = self.mailbox();
        loop {
            let notified = mailbox.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            self.ensure_working()?;
            match deadline {
                Some(deadline) => tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => return Ok(()),
                    _ = notified => {}
                },
                None => notified.await,
            }
        }
    }

    /// Run a blocking closure on the runtime's blocking pool.
    ///
    /// Fails with `NotWorking` if the agent is already finished, or finishes
    /// while the closure runs (its result is then discarded).
    pub async fn call_blocking<F, T>(&self, f: F) -> AgentResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.ensure_working()?;
        let out = run_blocking(f).await?;
        self.ensure_working()?;
        Ok(out)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    pub(crate) fn ensure_working(&self) -> AgentResult<()> {
        if self.working() { Ok(()) } else { Err(AgentError::NotWorking) }
    }

    fn registered(&self) -> AgentResult<&Register> {
        self.register()
            .ok_or_else(|| AgentError::Unregistered(self.name().clone()))
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        self.inner.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name().as_str())
            .field("working", &self.working())
            .field("pending", &self.mailbox().len())
            .finish()
    }
}

/// Run `f` on the blocking pool regardless of any agent's state.
///
/// Used for cleanup that must happen after an agent has finished (resetting
/// an output pin, flushing a sink).
pub(crate) async fn run_blocking<F, T>(f: F) -> AgentResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgentError::Blocking(e.to_string()))
}
