//! Per-agent message queue.
//!
//! # Wake-up protocol
//!
//! A mailbox pairs a `Mutex<VecDeque<Message>>` with a `tokio::sync::Notify`.
//! Every push, and every `finish()` of the owning agent, calls
//! `notify_waiters`, which wakes all *registered* waiters and stores no
//! permit.  A waiter therefore registers (`Notified::enable`) before it
//! inspects the queue or the working flag:
//!
//! ```text
//! enable()  →  check flag / scan queue  →  await notified
//! ```
//!
//! so a push or finish that lands between the scan and the await is never
//! lost.  Several waiters with different filters (`recv` and
//! `recv_from(OBSERVER)`) may wait on one mailbox; each rescans on wake-up.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use cx_core::Message;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

#[derive(Debug, Default)]
pub struct Mailbox {
    queue:  Mutex<VecDeque<Message>>,
    notify: Notify,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` and wake every waiter.
    pub fn push(&self, message: Message) {
        self.lock().push_back(message);
        self.notify.notify_waiters();
    }

    /// Remove and return the oldest message matching `pred`.
    pub fn take_first<F>(&self, pred: F) -> Option<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let mut queue = self.lock();
        let idx = queue.iter().position(pred)?;
        queue.remove(idx)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wake every waiter without pushing anything.
    pub(crate) fn wake_all(&self) {
        self.notify.notify_waiters();
    }

    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
