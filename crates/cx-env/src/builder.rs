//! Fluent builder for constructing an [`Environment`].

use std::collections::HashSet;

use cx_agent::{Agent, Register};

use crate::{EnvError, EnvObserver, EnvResult, Environment, NoopObserver};

/// Fluent builder for [`Environment`].
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                  |
/// |----------------------|------------------------------------------|
/// | `.name(s)`           | `"env"`                                  |
/// | `.agent(a)`          | no agents                                |
/// | `.interrupt_via(o)`  | Ctrl-C is not intercepted                |
/// | `.observer(o)`       | [`NoopObserver`]                         |
///
/// # Routing
///
/// If none of the agents is registered yet, `build()` creates one
/// [`Register`] over exactly these agents.  Agents that were registered
/// beforehand (typically one register spanning several parallel
/// environments) are left as they are.  A mix of the two is rejected.
///
/// # Example
///
/// ```rust,ignore
/// let obs = observer();
/// let mut env = EnvironmentBuilder::new()
///     .name("session")
///     .agents([sender, receiver, obs.clone()])
///     .interrupt_via(&obs)
///     .build()?;
/// let report = env.run()?;
/// ```
pub struct EnvironmentBuilder {
    name:      String,
    agents:    Vec<Agent>,
    interrupt: Option<Agent>,
    observer:  Option<Box<dyn EnvObserver>>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            name:      "env".to_owned(),
            agents:    Vec::new(),
            interrupt: None,
            observer:  None,
        }
    }

    /// Name used for the tracing span, the report and the parallel thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = Agent>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Escalate the first Ctrl-C during `run` into an `Abend` broadcast
    /// from `observer`.
    pub fn interrupt_via(mut self, observer: &Agent) -> Self {
        self.interrupt = Some(observer.clone());
        self
    }

    pub fn observer(mut self, observer: impl EnvObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Validate the agent set, register it if needed, and return a
    /// ready-to-run [`Environment`].
    pub fn build(self) -> EnvResult<Environment> {
        if self.name.is_empty() {
            return Err(EnvError::Config("environment name must not be empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.agents.len());
        for agent in &self.agents {
            if !seen.insert(agent.name().as_str()) {
                return Err(EnvError::DuplicateAgent(agent.name().clone()));
            }
        }

        let unbound: Vec<&Agent> = self.agents.iter().filter(|a| a.register().is_none()).collect();
        if unbound.len() == self.agents.len() {
            if !self.agents.is_empty() {
                Register::new(&self.agents)?;
            }
        } else if let Some(first) = unbound.first() {
            return Err(EnvError::Config(format!(
                "agent {:?} has no register while others in {:?} do",
                first.name().as_str(),
                self.name,
            )));
        }

        Ok(Environment {
            name:      self.name,
            agents:    self.agents,
            interrupt: self.interrupt,
            observer:  self.observer.unwrap_or_else(|| Box::new(NoopObserver)),
        })
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
