//! Agent naming.
//!
//! Agents are addressed by name, not by index: names are what the routing
//! register is keyed on and what appears in logs.  `AgentName` wraps an
//! `Arc<str>` so every message can carry its origin without reallocating.

use std::fmt;
use std::sync::Arc;

/// Name of the observer agent that relays termination codes.
pub const OBSERVER: &str = "observer";

/// Name of the agent that drives stimulus hardware.
pub const STIMULATOR: &str = "stimulator";

/// Name of the agent that reads device input.
pub const READER: &str = "reader";

/// Name of the agent that buffers and writes timestamped events.
pub const RECORDER: &str = "recorder";

/// The unique name of an agent within a register.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentName(Arc<str>);

impl AgentName {
    pub fn new(name: impl AsRef<str>) -> Self {
        AgentName(Arc::from(name.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the observer's reserved name.
    #[inline]
    pub fn is_observer(&self) -> bool {
        &*self.0 == OBSERVER
    }
}

impl From<&str> for AgentName {
    fn from(s: &str) -> Self {
        AgentName::new(s)
    }
}

impl From<String> for AgentName {
    fn from(s: String) -> Self {
        AgentName(Arc::from(s))
    }
}

impl From<&AgentName> for AgentName {
    fn from(n: &AgentName) -> Self {
        n.clone()
    }
}

impl AsRef<str> for AgentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for AgentName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AgentName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for AgentName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentName({})", self.0)
    }
}
