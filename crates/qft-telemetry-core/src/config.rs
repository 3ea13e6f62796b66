//! Run configuration and the per-run record context.
//!
//! Configuration is parsed from TOML. All fields have defaults, so an
//! empty document yields a usable configuration with the default
//! observation filter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{FilterError, ObservationFilter, DEFAULT_OBSERVED_NODES};

/// Instance identifier used before the host run supplies its run id.
pub const DEFAULT_INSTANCE_ID: &str = "unknown";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the TOML document.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize the configuration.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Telemetry configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Pattern deciding which node types are observed.
    #[serde(default = "default_observed_nodes")]
    pub observed_nodes: String,

    /// Per-run instance identifier tagged onto all outgoing records.
    ///
    /// Opaque to the core; usually replaced by the host's run id when the
    /// run starts.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    /// Hardware description for the record context.
    #[serde(default = "default_hardware")]
    pub hardware: String,

    /// Execution location (e.g. the machine name), empty if unknown.
    #[serde(default)]
    pub location: String,

    /// Operating system name for the record context.
    #[serde(default = "default_os")]
    pub os: String,

    /// Source software name, extended with the host version when known.
    #[serde(default = "default_software")]
    pub software: String,
}

fn default_observed_nodes() -> String {
    DEFAULT_OBSERVED_NODES.to_string()
}

fn default_instance_id() -> String {
    DEFAULT_INSTANCE_ID.to_string()
}

fn default_hardware() -> String {
    "Workstation".to_string()
}

fn default_os() -> String {
    std::env::consts::OS.to_string()
}

fn default_software() -> String {
    "QF-Test".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            observed_nodes: default_observed_nodes(),
            instance_id: default_instance_id(),
            hardware: default_hardware(),
            location: String::new(),
            os: default_os(),
            software: default_software(),
        }
    }
}

impl TelemetryConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::from)
    }

    /// Compiles the configured observation filter.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if the pattern does not compile; an
    /// invalid pattern surfaces here, not at match time.
    pub fn filter(&self) -> Result<ObservationFilter, FilterError> {
        ObservationFilter::new(&self.observed_nodes)
    }

    /// Builds the per-run record context from the configured fields.
    #[must_use]
    pub fn context(&self) -> RecordContext {
        RecordContext {
            instance_id: self.instance_id.clone(),
            hardware: self.hardware.clone(),
            location: self.location.clone(),
            os: self.os.clone(),
            software: self.software.clone(),
        }
    }
}

/// Opaque per-run tagging block handed to collector implementations.
///
/// The core never interprets these values; collectors attach them to the
/// outgoing records' context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContext {
    /// Per-run instance identifier (the host's run id once known).
    pub instance_id: String,
    /// Hardware description.
    pub hardware: String,
    /// Execution location.
    pub location: String,
    /// Operating system name.
    pub os: String,
    /// Source software name.
    pub software: String,
}
