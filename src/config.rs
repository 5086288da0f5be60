//! Configuration management for Drip.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{DripError, Result};
use crate::ratelimit::LimiterState;

/// Prefix for environment variable overrides, e.g. `DRIP__SERVER__GRPC_ADDR`.
const ENV_PREFIX: &str = "DRIP";
const ENV_SEPARATOR: &str = "__";

/// Main configuration for the Drip service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DripConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Limiter served at startup. Without it, clients must call `Configure`
    /// before any admission succeeds.
    #[serde(default)]
    pub limiter: Option<LimiterConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8081))
}

/// Leaky bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum fill level of each bucket
    pub capacity: f64,
    /// Units drained per second
    pub leak_rate: f64,
}

impl LimiterConfig {
    /// Build the initial limiter snapshot.
    pub fn build(&self) -> Result<LimiterState> {
        LimiterState::new(self.capacity, self.leak_rate)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl DripConfig {
    /// Load configuration from an optional YAML file, then apply
    /// `DRIP__`-prefixed environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        let config: DripConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DripConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| DripError::Config(e.to_string()))
    }

    /// Check that the limiter parameters, if any, are usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(limiter) = &self.limiter {
            limiter
                .build()
                .map_err(|e| DripError::Config(format!("invalid limiter: {}", e)))?;
        }
        Ok(())
    }
}
