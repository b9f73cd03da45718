//! Messages exchanged between agent mailboxes.
//!
//! A [`Message`] is an `(origin, payload)` pair.  Control codes live in their
//! own [`Payload::Control`] variant, so no application value can ever be
//! mistaken for a termination signal on a shared channel.

use std::fmt;

use crate::{AgentName, CoreError, EventTime};

// ── Control ───────────────────────────────────────────────────────────────────

/// Reserved lifecycle codes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Control {
    /// Experiment start.
    Start,
    /// Normal end.
    Nend,
    /// Abnormal end.
    Abend,
}

impl Control {
    /// Wire-level code: `Start = 0`, `Nend = 1`, `Abend = -1`.
    #[inline]
    pub fn code(self) -> i8 {
        match self {
            Control::Start => 0,
            Control::Nend  => 1,
            Control::Abend => -1,
        }
    }

    /// `true` for codes that end the experiment.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Control::Nend | Control::Abend)
    }
}

impl TryFrom<i64> for Control {
    type Error = CoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0  => Ok(Control::Start),
            1  => Ok(Control::Nend),
            -1 => Ok(Control::Abend),
            other => Err(CoreError::UnknownControl(other)),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Control::Start => "START",
            Control::Nend  => "NEND",
            Control::Abend => "ABEND",
        };
        f.write_str(label)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// An opaque application value: a device line, an interval, a reading.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v)   => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v)  => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// The body of a message.
#[derive(Clone, PartialEq, Debug)]
pub enum Payload {
    Control(Control),
    Value(Value),
    Event(EventTime),
}

impl Payload {
    /// The control code carried by this payload, if any.
    #[inline]
    pub fn control(&self) -> Option<Control> {
        match self {
            Payload::Control(c) => Some(*c),
            _ => None,
        }
    }

    /// `true` when this payload is `Nend` or `Abend`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.control().is_some_and(Control::is_terminal)
    }
}

impl From<Control> for Payload {
    fn from(c: Control) -> Self {
        Payload::Control(c)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Value(v)
    }
}

impl From<EventTime> for Payload {
    fn from(e: EventTime) -> Self {
        Payload::Event(e)
    }
}

// Plain values become application payloads, never control codes.
macro_rules! payload_from_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Payload {
            fn from(v: $t) -> Self {
                Payload::Value(Value::from(v))
            }
        })*
    };
}

payload_from_value!(i64, f64, &str, String);

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Control(c) => write!(f, "{c}"),
            Payload::Value(v)   => write!(f, "{v}"),
            Payload::Event(e)   => write!(f, "{e}"),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// An `(origin, payload)` pair as delivered by a mailbox.
#[derive(Clone, PartialEq, Debug)]
pub struct Message {
    pub origin:  AgentName,
    pub payload: Payload,
}

impl Message {
    pub fn new(origin: AgentName, payload: impl Into<Payload>) -> Self {
        Self { origin, payload: payload.into() }
    }

    /// Split into the tuple shape most task loops destructure.
    #[inline]
    pub fn into_parts(self) -> (AgentName, Payload) {
        (self.origin, self.payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.payload, self.origin)
    }
}
