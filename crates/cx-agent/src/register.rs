//! Name → mailbox routing table shared by a population of agents.
//!
//! A `Register` is built once from every agent that takes part in a session,
//! possibly spread over several environments, and each of those agents keeps
//! a handle to it.  The table maps names to *mailboxes*, not agents, so the
//! agent → register → agent cycle never forms.

use std::sync::Arc;

use cx_core::{AgentName, Message};

use crate::{Agent, AgentError, AgentResult, Mailbox};

#[cfg(feature = "fx-hash")]
type MailboxMap = rustc_hash::FxHashMap<AgentName, Arc<Mailbox>>;
#[cfg(not(feature = "fx-hash"))]
type MailboxMap = std::collections::HashMap<AgentName, Arc<Mailbox>>;

#[derive(Clone)]
pub struct Register {
    mailboxes: Arc<MailboxMap>,
}

impl Register {
    /// Register `agents` with each other.
    ///
    /// Fails with `DuplicateName` if two agents share a name and with
    /// `AlreadyRegistered` if any agent already belongs to a register.  On
    /// failure no agent is modified.
    pub fn new(agents: &[Agent]) -> AgentResult<Self> {
        let mut map = MailboxMap::default();
        for agent in agents {
            if agent.register().is_some() {
                return Err(AgentError::AlreadyRegistered(agent.name().clone()));
            }
            if map.insert(agent.name().clone(), Arc::clone(agent.mailbox())).is_some() {
                return Err(AgentError::DuplicateName(agent.name().clone()));
            }
        }

        let register = Register { mailboxes: Arc::new(map) };
        for agent in agents {
            agent.bind(register.clone())?;
        }
        Ok(register)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mailboxes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &AgentName> {
        self.mailboxes.keys()
    }

    /// Enqueue `message` in `target`'s mailbox.
    pub(crate) fn deliver(&self, target: &str, message: Message) -> AgentResult<()> {
        let mailbox = self
            .mailboxes
            .get(target)
            .ok_or_else(|| AgentError::UnknownAgent(AgentName::new(target)))?;
        mailbox.push(message);
        Ok(())
    }

    /// Enqueue a copy of `message` for every agent except `except`.
    pub(crate) fn deliver_all(&self, except: &str, message: &Message) {
        for (name, mailbox) in self.mailboxes.iter() {
            if name.as_str() != except {
                mailbox.push(message.clone());
            }
        }
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.mailboxes.keys().map(AgentName::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Register").field("agents", &names).finish()
    }
}
