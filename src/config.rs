//! Configuration management for the chat relay
//!
//! Values come from built-in defaults, an optional `config.toml` in the working
//! directory, and `CHAT_RELAY_*` environment overrides, in that order.

use config::{Config, Environment, File};
use serde::Deserialize;

/// How the router writes to recipients relative to the registry lock.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Hold the registry lock for the whole scan-and-send sequence.
    #[default]
    Locked,
    /// Copy recipient handles under the lock, then write after releasing it.
    Snapshot,
}

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address to bind the listening socket
    /// Environment: CHAT_RELAY_BIND_ADDRESS
    pub bind_address: String,

    /// TCP port to listen on (0 picks an ephemeral port)
    /// Environment: CHAT_RELAY_PORT
    pub port: u16,

    // ═══ LIMITS ═══
    /// Capacity of the client table
    /// Environment: CHAT_RELAY_MAX_CLIENTS
    pub max_clients: usize,

    /// Receive bound for a single line, in bytes
    pub max_line_length: usize,

    /// Display names are truncated to this many characters
    pub max_name_length: usize,

    // ═══ ROUTING ═══
    #[serde(default)]
    pub delivery: DeliveryMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 55555,
            max_clients: 10,
            max_line_length: 999,
            max_name_length: 32,
            delivery: DeliveryMode::Locked,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file stem (the file itself is optional)
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address.as_str())?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_line_length", defaults.max_line_length as i64)?
            .set_default("max_name_length", defaults.max_name_length as i64)?
            .set_default("delivery", "locked")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CHAT_RELAY").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(config::ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        if self.max_name_length == 0 {
            return Err(config::ConfigError::Message(
                "max_name_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port joined as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_socket(), "0.0.0.0:55555");
        assert_eq!(config.delivery, DeliveryMode::Locked);
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = ServerConfig::default();
        config.max_clients = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.max_line_length = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.max_name_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(config.max_clients, ServerConfig::default().max_clients);
        assert_eq!(config.max_line_length, 999);
    }
}
