// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Reader configuration.
//!
//! Loaded from YAML, TOML or JSON. Durations are given in milliseconds.
//!
//! ```yaml
//! read_timeout_ms: 5000
//! close_timeout_ms: 2000
//! max_age_ms: 0
//! timestamps_to_return: both
//! nodes:
//!   - node_id: "ns=2;s=Line1.Temperature"
//!     browse_name: Temperature
//! ```
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use tagpoll_opcua::config::ReaderConfig;
//!
//! let config = ReaderConfig::builder()
//!     .read_timeout(Duration::from_secs(2))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.read_timeout(), Duration::from_secs(2));
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::types::{NodeDef, ReadRequest, TimestampsToReturn};

/// Default read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// Default close timeout in milliseconds.
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 2_000;

// =============================================================================
// ReaderConfig
// =============================================================================

/// Settings for [`ReadCoordinator`](crate::reader::ReadCoordinator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Deadline for one read when the caller gives none.
    pub read_timeout_ms: u64,

    /// Upper bound on closing a dead session.
    pub close_timeout_ms: u64,

    /// Maximum cache age the server may answer from.
    pub max_age_ms: f64,

    /// Timestamps requested with each value.
    pub timestamps_to_return: TimestampsToReturn,

    /// Tags to read.
    pub nodes: Vec<NodeDef>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            max_age_ms: 0.0,
            timestamps_to_return: TimestampsToReturn::Both,
            nodes: Vec::new(),
        }
    }
}

impl ReaderConfig {
    /// Returns a builder starting from the defaults.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::default()
    }

    /// Returns the read timeout as a Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns the close timeout as a Duration.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Builds a read request for `nodes` using these settings.
    pub fn request_for(&self, nodes: &[NodeDef]) -> ReadRequest {
        ReadRequest::for_nodes(nodes)
            .with_max_age(self.max_age_ms)
            .with_timestamps(self.timestamps_to_return)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("read_timeout_ms", "must be greater than zero"));
        }
        if self.close_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("close_timeout_ms", "must be greater than zero"));
        }
        if !self.max_age_ms.is_finite() || self.max_age_ms < 0.0 {
            return Err(ConfigError::invalid_value(
                "max_age_ms",
                format!("must be a non-negative number, got {}", self.max_age_ms),
            ));
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(&node.node_id) {
                return Err(ConfigError::invalid_value(
                    "nodes",
                    format!("duplicate node id {}", node.node_id),
                ));
            }
        }

        Ok(())
    }

    /// Parses and validates a configuration document.
    pub fn from_str(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Yaml => parse_yaml(content)?,
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::parse("TOML", e))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::parse("JSON", e))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file. The format follows the
    /// file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading reader configuration from: {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_str(&content, format)?;

        debug!(
            nodes = config.nodes.len(),
            read_timeout_ms = config.read_timeout_ms,
            "Reader configuration loaded"
        );
        Ok(config)
    }
}

fn parse_yaml<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ConfigError::parse("YAML", e))
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML.
    Yaml,
    /// TOML.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

// =============================================================================
// ReaderConfigBuilder
// =============================================================================

/// Builder for [`ReaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Sets the close timeout.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Sets the maximum cache age in milliseconds.
    pub fn max_age_ms(mut self, max_age_ms: f64) -> Self {
        self.config.max_age_ms = max_age_ms;
        self
    }

    /// Sets the timestamps to return.
    pub fn timestamps_to_return(mut self, timestamps: TimestampsToReturn) -> Self {
        self.config.timestamps_to_return = timestamps;
        self
    }

    /// Adds a tag.
    pub fn node(mut self, node: impl Into<NodeDef>) -> Self {
        self.config.nodes.push(node.into());
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<ReaderConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
read_timeout_ms: 1500
close_timeout_ms: 250
max_age_ms: 100
timestamps_to_return: source
nodes:
  - node_id: "ns=2;s=Line1.Temperature"
    browse_name: Temperature
  - node_id: "ns=2;i=1002"
"#;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.close_timeout(), Duration::from_secs(2));
        assert_eq!(config.max_age_ms, 0.0);
        assert_eq!(config.timestamps_to_return, TimestampsToReturn::Both);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml() {
        let config = ReaderConfig::from_str(YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.read_timeout(), Duration::from_millis(1500));
        assert_eq!(config.close_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_age_ms, 100.0);
        assert_eq!(config.timestamps_to_return, TimestampsToReturn::Source);
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].node_id, NodeId::string(2, "Line1.Temperature"));
        assert_eq!(config.nodes[0].browse_name, "Temperature");
        assert_eq!(config.nodes[1].node_id, NodeId::numeric(2, 1002));
    }

    #[test]
    fn test_toml_and_json() {
        let toml = r#"
read_timeout_ms = 800

[[nodes]]
node_id = "i=2258"
"#;
        let config = ReaderConfig::from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.read_timeout_ms, 800);
        assert_eq!(config.close_timeout_ms, DEFAULT_CLOSE_TIMEOUT_MS);
        assert_eq!(config.nodes[0].node_id, NodeId::numeric(0, 2258));

        let json = r#"{"timestamps_to_return":"neither"}"#;
        let config = ReaderConfig::from_str(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.timestamps_to_return, TimestampsToReturn::Neither);
    }

    #[test]
    fn test_invalid_node_id_is_parse_error() {
        let json = r#"{"nodes":[{"node_id":"ns=2;q=1"}]}"#;
        let error = ReaderConfig::from_str(json, ConfigFormat::Json).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { format: "JSON", .. }));
        assert!(error.to_string().contains("ns=2;q=1"));
    }

    #[test]
    fn test_validation() {
        let zero = ReaderConfig::from_str(r#"{"read_timeout_ms":0}"#, ConfigFormat::Json);
        assert!(matches!(
            zero,
            Err(ConfigError::InvalidValue { field: "read_timeout_ms", .. })
        ));

        let negative = ReaderConfig::builder().max_age_ms(-1.0).build();
        assert!(matches!(
            negative,
            Err(ConfigError::InvalidValue { field: "max_age_ms", .. })
        ));

        let duplicate = ReaderConfig::builder()
            .node(NodeId::numeric(2, 1))
            .node(NodeId::numeric(2, 1))
            .build();
        assert!(matches!(
            duplicate,
            Err(ConfigError::InvalidValue { field: "nodes", .. })
        ));

        assert!(ReaderConfig::builder()
            .close_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_request_for_uses_settings() {
        let config = ReaderConfig::builder()
            .max_age_ms(250.0)
            .timestamps_to_return(TimestampsToReturn::Server)
            .build()
            .unwrap();
        let nodes = vec![NodeDef::new(NodeId::numeric(2, 1)), NodeDef::new(NodeId::numeric(2, 2))];

        let request = config.request_for(&nodes);
        assert_eq!(request.len(), 2);
        assert_eq!(request.max_age_ms, 250.0);
        assert_eq!(request.timestamps_to_return, TimestampsToReturn::Server);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::with_suffix(".yml").unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = ReaderConfig::load(file.path()).unwrap();
        assert_eq!(config.nodes.len(), 2);
    }

    #[test]
    fn test_load_errors() {
        let file = NamedTempFile::with_suffix(".ini").unwrap();
        assert!(matches!(
            ReaderConfig::load(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        assert!(matches!(
            ReaderConfig::load("/nonexistent/reader.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
