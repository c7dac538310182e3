//! Configuration management for the Outpost session server.
//!
//! This module handles loading, validation, and conversion of server
//! configuration from TOML files and command-line arguments.

use serde::{Deserialize, Serialize};
use session_core::Tier;
use std::path::Path;
use tracing::info;
use world_server::ServerConfig;

/// Application configuration loaded from a TOML file.
///
/// Encompasses all server settings: networking, command registration
/// policy, and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    pub server: ServerSettings,
    /// Command registration settings
    #[serde(default)]
    pub commands: CommandSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrently connected players
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Seconds a client has to complete the WebSocket handshake
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

/// Command registration policy for newly connected players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSettings {
    /// Privilege tier assigned to new connections, 0 (owner) to 3 (any)
    #[serde(default = "default_tier")]
    pub default_tier: u8,
    /// Commands registered for each new player; empty registers all
    #[serde(default)]
    pub allowlist: Vec<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

fn default_max_connections() -> usize {
    1000
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_tier() -> u8 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "127.0.0.1:8080".to_string(),
                max_connections: default_max_connections(),
                connection_timeout: default_connection_timeout(),
            },
            commands: CommandSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            default_tier: default_tier(),
            allowlist: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration is written to
    /// that path and returned.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string
    /// describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", &self.server.bind_address));
        }

        if self.server.max_connections == 0 {
            return Err("max_connections must be greater than zero".to_string());
        }

        if Tier::try_from(self.commands.default_tier).is_err() {
            return Err(format!(
                "Invalid default tier: {} (expected 0-3)",
                self.commands.default_tier
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!("Invalid log level: {}", &self.logging.level));
        }

        Ok(())
    }

    /// Converts the application configuration to a world server
    /// configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            connection_timeout: self.server.connection_timeout,
            default_tier: Tier::try_from(self.commands.default_tier)?,
            command_allowlist: if self.commands.allowlist.is_empty() {
                None
            } else {
                Some(self.commands.allowlist.clone())
            },
        })
    }
}
