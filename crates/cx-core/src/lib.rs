//! `cx-core` — foundational types for the `rust_cx` experiment framework.
//!
//! This crate is a dependency of every other `cx-*` crate.  It has no `cx-*`
//! dependencies and minimal external ones (`rand`, `thiserror`, `serde`,
//! `serde_norway`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentName` and the reserved role names               |
//! | [`message`]     | `Control`, `Value`, `Payload`, `Message`              |
//! | [`time`]        | `EventTime`, `timestamp`, `SessionClock`              |
//! | [`rng`]         | `SessionRng` (seeded shuffling RNG)                   |
//! | [`config`]      | `ExperimentConfig` and its YAML sections              |
//! | [`error`]       | `CoreError`, `CoreResult`                             |

pub mod config;
pub mod error;
pub mod ids;
pub mod message;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{Comport, ExperimentConfig, Experimental, Metadata, PinMode};
pub use error::{CoreError, CoreResult};
pub use ids::{AgentName, OBSERVER, READER, RECORDER, STIMULATOR};
pub use message::{Control, Message, Payload, Value};
pub use rng::SessionRng;
pub use time::{EventTime, SessionClock, timestamp};
