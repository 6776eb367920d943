//! ECU simulator configuration
//!
//! Loaded from TOML or YAML. Every field has a default so a partial file
//! (or none at all) is valid.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete ECU simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcuConfig {
    /// ECU identifier
    #[serde(default = "default_id")]
    pub id: String,

    /// ECU name
    #[serde(default = "default_name")]
    pub name: String,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_id() -> String {
    "uds_ecu".to_string()
}

fn default_name() -> String {
    "UDS ECU Simulator".to_string()
}

impl Default for EcuConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            name: default_name(),
            transport: TransportConfig::default(),
        }
    }
}

impl EcuConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.socket_addr()?;
        if self.transport.max_request_size == 0 {
            return Err(ConfigError::Invalid(
                "transport.max_request_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// TCP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address the simulator listens on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Read buffer size; longer requests are truncated
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,

    /// How long to wait for a request after accepting (0 = no timeout)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_max_request_size() -> usize {
    4096
}

fn default_read_timeout_ms() -> u64 {
    5000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            max_request_size: default_max_request_size(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl TransportConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "listen_address '{}': {}",
                self.listen_address, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = EcuConfig::default();
        assert_eq!(config.transport.listen_address, "0.0.0.0:5001");
        assert_eq!(config.transport.max_request_size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: EcuConfig = toml::from_str(
            r#"
            name = "Bench ECU"

            [transport]
            listen_address = "127.0.0.1:6001"
            "#,
        )
        .unwrap();
        assert_eq!(config.id, "uds_ecu");
        assert_eq!(config.name, "Bench ECU");
        assert_eq!(config.transport.listen_address, "127.0.0.1:6001");
        assert_eq!(config.transport.read_timeout_ms, 5000);
    }

    #[test]
    fn load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id = \"bench\"\n[transport]\nmax_request_size = 512").unwrap();
        let config = EcuConfig::load(file.path()).unwrap();
        assert_eq!(config.id, "bench");
        assert_eq!(config.transport.max_request_size, 512);
    }

    #[test]
    fn load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id: bench\ntransport:\n  read_timeout_ms: 0").unwrap();
        let config = EcuConfig::load_yaml(file.path()).unwrap();
        assert_eq!(config.id, "bench");
        assert_eq!(config.transport.read_timeout_ms, 0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = EcuConfig::default();
        config.transport.listen_address = "not-an-address".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EcuConfig::default();
        config.transport.max_request_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            EcuConfig::load("/nonexistent/uds-ecu.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
