//! # Machine-topology configuration
//!
//! A machine is described by one TOML file: interpolation resolution, feed
//! policy, the reference-point position, and the ordered list of canals,
//! each naming its handler sequence. The chain wiring is driven entirely by
//! this file; there is no runtime branching on machine names.
//!
//! ```toml
//! [machine]
//! name = "iso-turn"
//!
//! [interpolation]
//! max_segment = 0.5
//!
//! [feed]
//! default_feed = 100.0
//! rapid_rate = 10000.0
//!
//! [reference]
//! X = 0.0
//! Z = 50.0
//!
//! [[canals]]
//! name = "C1"
//! handlers = ["setup", "motion"]
//! ```

// src/config.rs - single configuration file
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{Axis, AxisMap};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("canal '{canal}' names unknown handler '{handler}'")]
    UnknownHandler { canal: String, handler: String },
    #[error("reference position names unknown axis '{name}'")]
    UnknownReferenceAxis { name: String },
    #[error("machine config declares no canals")]
    NoCanals,
    #[error("{field} must be a positive number, got {value}")]
    NonPositiveValue { field: &'static str, value: f64 },
}

/// Main configuration struct for the machine, interpolation, feed policy
/// and canal topology.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub machine: MachineSection,
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    /// Reference-point position, keyed by axis letter. Axes not named sit
    /// at zero.
    #[serde(default)]
    pub reference: BTreeMap<String, f64>,
    #[serde(default = "default_canals")]
    pub canals: Vec<CanalConfig>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            machine: MachineSection::default(),
            interpolation: InterpolationConfig::default(),
            feed: FeedConfig::default(),
            reference: BTreeMap::new(),
            canals: default_canals(),
        }
    }
}

impl MachineConfig {
    /// Reject rates and resolutions the interpolators cannot work with.
    /// A zero `max_segment` in particular would make arc sampling divide
    /// by zero when sizing its step count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("interpolation.max_segment", self.interpolation.max_segment),
            ("feed.default_feed", self.feed.default_feed),
            ("feed.rapid_rate", self.feed.rapid_rate),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveValue { field, value });
            }
        }
        Ok(())
    }

    pub fn reference_position(&self) -> Result<AxisMap, ConfigError> {
        let mut position = AxisMap::default();
        for (name, value) in &self.reference {
            let axis = name
                .chars()
                .next()
                .filter(|_| name.chars().count() == 1)
                .and_then(Axis::from_letter)
                .ok_or_else(|| ConfigError::UnknownReferenceAxis { name: name.clone() })?;
            position.set(axis, *value);
        }
        Ok(position)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MachineSection {
    #[serde(default = "default_machine_name")]
    pub name: String,
}

impl Default for MachineSection {
    fn default() -> Self {
        Self { name: default_machine_name() }
    }
}

/// Arc sampling resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterpolationConfig {
    /// Maximum chord length of one sampled arc step, in machine units.
    #[serde(default = "default_max_segment")]
    pub max_segment: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { max_segment: default_max_segment() }
    }
}

/// Feed policy: the substitute for cutting moves that run before any F
/// word (always reported as a warning) and the machine's rapid rate, both
/// in units per minute.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed")]
    pub default_feed: f64,
    #[serde(default = "default_rapid_rate")]
    pub rapid_rate: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { default_feed: default_feed(), rapid_rate: default_rapid_rate() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CanalConfig {
    pub name: String,
    #[serde(default = "default_handlers")]
    pub handlers: Vec<String>,
}

fn default_machine_name() -> String {
    "machine".to_string()
}

fn default_max_segment() -> f64 {
    0.5
}

fn default_feed() -> f64 {
    100.0
}

fn default_rapid_rate() -> f64 {
    10_000.0
}

fn default_handlers() -> Vec<String> {
    vec!["setup".to_string(), "motion".to_string()]
}

fn default_canals() -> Vec<CanalConfig> {
    vec![CanalConfig { name: "C1".to_string(), handlers: default_handlers() }]
}

pub fn load_config(path: impl AsRef<Path>) -> Result<MachineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: MachineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
