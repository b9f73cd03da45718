//! YAML experiment configuration.
//!
//! # File format
//!
//! ```yaml
//! Comport:
//!   port: /dev/ttyACM0
//!   baudrate: 115200
//!   timeout: 1.0
//! Experimental:
//!   trials: 20
//!   seed: 7
//!   intervals: { model: exponential, mean: 10.0, min: 2.0 }
//! Metadata:
//!   experiment: vi
//!   subject: rat01
//!   condition: baseline
//! PinMode:
//!   13: output
//!   2: input
//! ```
//!
//! Every section is optional and defaults to empty.  `Experimental` is a
//! free-form map; callers pull typed values out of it with
//! [`Experimental::get`], so schedule parameters can be any
//! `Deserialize` type (including `cx_schedule::IntervalModel`).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{CoreError, CoreResult};

// ── Sections ──────────────────────────────────────────────────────────────────

/// Serial connection settings for the device driver.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Comport {
    pub port:     Option<String>,
    pub baudrate: Option<u32>,
    /// Read timeout in seconds.
    pub timeout:  Option<f64>,
}

/// Free-form experiment parameters.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Experimental(BTreeMap<String, serde_norway::Value>);

impl Experimental {
    /// Deserialize the value under `key` as `T`.
    ///
    /// Fails with [`CoreError::Config`] if the key is absent and with
    /// [`CoreError::Parse`] if it has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CoreResult<T> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| CoreError::Config(format!("missing Experimental.{key}")))?;
        Ok(serde_norway::from_value(value.clone())?)
    }

    /// Like [`get`](Self::get) but falls back to `default` when the key is absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> CoreResult<T> {
        if self.0.contains_key(key) {
            self.get(key)
        } else {
            Ok(default)
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Identifiers used to name output files.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub experiment: Option<String>,
    pub subject:    Option<String>,
    pub condition:  Option<String>,
    /// Any other keys the settings file carries.
    #[serde(flatten)]
    pub extra:      BTreeMap<String, serde_norway::Value>,
}

impl Metadata {
    /// The value of a recognized key, or `""` when it is unset.
    pub fn get(&self, key: &str) -> &str {
        let field = match key {
            "experiment" => &self.experiment,
            "subject"    => &self.subject,
            "condition"  => &self.condition,
            _ => {
                return self
                    .extra
                    .get(key)
                    .and_then(serde_norway::Value::as_str)
                    .unwrap_or("");
            }
        };
        field.as_deref().unwrap_or("")
    }
}

/// Direction / function of a device pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    #[serde(alias = "INPUT")]
    Input,
    #[serde(alias = "OUTPUT")]
    Output,
    #[serde(alias = "INPUT_PULLUP", alias = "input_pullup")]
    InputPullup,
    #[serde(alias = "PWM")]
    Pwm,
    #[serde(alias = "SERVO")]
    Servo,
    #[serde(alias = "ANALOG")]
    Analog,
}

// ── ExperimentConfig ──────────────────────────────────────────────────────────

/// Top-level experiment settings, loaded from YAML.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ExperimentConfig {
    #[serde(rename = "Comport", default)]
    pub comport:      Comport,
    #[serde(rename = "Experimental", default)]
    pub experimental: Experimental,
    #[serde(rename = "Metadata", default)]
    pub metadata:     Metadata,
    #[serde(rename = "PinMode", default)]
    pub pinmode:      BTreeMap<u8, PinMode>,
}

impl ExperimentConfig {
    /// Load settings from a YAML file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    /// Pins configured as outputs, in ascending order.
    pub fn output_pins(&self) -> Vec<u8> {
        self.pinmode
            .iter()
            .filter(|(_, mode)| matches!(mode, PinMode::Output | PinMode::Pwm | PinMode::Servo))
            .map(|(&pin, _)| pin)
            .collect()
    }
}

impl FromStr for ExperimentConfig {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An empty document deserializes to `null`; treat it as all-defaults.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_norway::from_str(s)?)
    }
}
