//! Connection layer for client transports.
//!
//! This module defines the transport seam the rest of the server works
//! against: [`ConnectionHandle`] abstracts over the wire so that the
//! player registry and dispatcher never touch sockets directly. Two
//! implementations are provided:
//!
//! * [`WsConnection`] - the production WebSocket transport
//! * [`LoopbackConnection`] - an in-process transport for tests and
//!   embedders

pub mod handle;
pub mod loopback;
pub mod ws;

pub use handle::ConnectionHandle;
pub use loopback::LoopbackConnection;
pub use ws::WsConnection;
