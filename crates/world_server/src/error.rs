//! Error types and handling for the world server.
//!
//! This module defines the coarse server-level error type. Per-session
//! faults (authorization, malformed frames, handler failures) use
//! [`session_core::SessionError`] instead.

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related and internal server errors
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or handshake issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}
