//! Error types shared across the session server.
//!
//! This module defines the single error taxonomy used by the player
//! registry, the command dispatcher, and the transport layer. Variants are
//! grouped by where they arise and how they propagate:
//!
//! * `CommandNotFound` / `TierExceeded` - registration-time rejects; logged
//!   and the offending name is skipped, never fatal and never surfaced to
//!   the player directly
//! * `MalformedMessage` - a frame that failed to parse; the frame is
//!   dropped and reported, the connection stays open
//! * `ConnectionClosed` - a send attempted on a non-open connection
//! * `HandlerFailure` - a fault inside a command handler, caught by the
//!   executor and routed to the error sink
//! * `Scheduling` - the run queue rejected work; the one fatal class,
//!   always surfaced to the caller rather than swallowed

/// Errors raised by session operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// A command name was requested for registration but never added to the
    /// command table.
    #[error("command {0} does not exist")]
    CommandNotFound(String),

    /// A command demands more privilege than the player holds.
    #[error("command {command} exceeds the tier for {username}")]
    TierExceeded {
        /// The command that was rejected.
        command: String,
        /// The player whose tier was insufficient.
        username: String,
    },

    /// An inbound frame could not be parsed as an event mapping.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A send was attempted while the connection was not open.
    #[error("connection is not open")]
    ConnectionClosed,

    /// A command handler returned an error or panicked.
    #[error("handler failure: {0}")]
    HandlerFailure(String),

    /// The executor could not schedule work. Unlike handler faults this is
    /// fatal to the operation and is returned to the caller.
    #[error("scheduling error: {0}")]
    Scheduling(String),
}
