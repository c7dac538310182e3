//! # World Server - Session Server Core
//!
//! The core of the Outpost session server: a live registry of connected
//! players, a tier-gated command table, and the dispatch pipeline that
//! parses, authorizes, and executes text commands arriving over persistent
//! WebSocket connections.
//!
//! ## Architecture Overview
//!
//! * **World** - the registry of connected [`Player`]s; accepts new
//!   connections, removes kicked/disconnected players, and broadcasts
//! * **Player** - one connected client: identity, privilege tier, named
//!   event subscriptions, and exclusive ownership of its connection
//! * **CommandTable** - the name → (tier, handler) mapping with
//!   copy-on-read snapshots
//! * **Dispatcher** - per-player command registration and the dispatch
//!   state machine
//! * **Connection layer** - the [`connection::ConnectionHandle`] seam with
//!   a WebSocket implementation and an in-process loopback implementation
//!
//! ## Message Flow
//!
//! 1. A client connects; the accept loop performs the WebSocket handshake
//! 2. The World wraps the connection into a Player and the Dispatcher
//!    registers the player's permitted commands
//! 3. Each inbound text frame is a JSON mapping of event name → payload
//! 4. The `"command"` payload is tokenized, authorized against the live
//!    command table, and the matching handler runs through the
//!    [`AsyncExecutor`](session_core::AsyncExecutor)
//! 5. Handlers respond to the player themselves; authorization failures
//!    get the canonical `"Invalid command."` reply
//!
//! ## Thread Safety
//!
//! All shared state lives behind async-aware locks: the player registry
//! and command table use `RwLock`-guarded collections with single-writer
//! mutation and copy-on-read snapshots, so dispatch never observes a torn
//! table and a kick can never race a concurrent add.

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::WorldServer;

// Public module declarations
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod player;
pub mod server;
pub mod world;

// Cross-module scenario tests
mod tests;
