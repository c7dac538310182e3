//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default
//! values used to initialize and customize world server behavior.

use serde::{Deserialize, Serialize};
use session_core::Tier;
use std::net::SocketAddr;

/// Configuration structure for the world server.
///
/// Contains all parameters the core needs: network settings, connection
/// limits, and the command-registration policy applied to new players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrently connected players
    pub max_connections: usize,

    /// Seconds a client has to complete the WebSocket handshake
    pub connection_timeout: u64,

    /// Privilege tier assigned to players the identity provider does not
    /// classify otherwise
    pub default_tier: Tier,

    /// Commands registered for each newly connected player. `None`
    /// registers every command currently in the table.
    pub command_allowlist: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().expect("Invalid default bind address"),
            max_connections: 1000,
            connection_timeout: 60,
            default_tier: Tier::Any,
            command_allowlist: None,
        }
    }
}
