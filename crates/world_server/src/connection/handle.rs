//! The transport abstraction owned by each player.

use async_trait::async_trait;
use session_core::{ConnectionState, SessionError};

/// Abstraction over a client's underlying transport connection.
///
/// A [`Player`](crate::player::Player) exclusively owns one handle for its
/// connected lifetime and is responsible for closing it. The handle is the
/// only place connection state lives; everything above it checks
/// [`ConnectionHandle::state`] before writing.
#[async_trait]
pub trait ConnectionHandle: Send + Sync + std::fmt::Debug {
    /// Current lifecycle state of the transport.
    fn state(&self) -> ConnectionState;

    /// Writes one text frame to the transport.
    ///
    /// # Returns
    ///
    /// `Err(SessionError::ConnectionClosed)` when the transport is not
    /// open or the write fails; the connection is considered unusable for
    /// further sends in either case.
    async fn send_text(&self, text: &str) -> Result<(), SessionError>;

    /// Forces the transport closed.
    ///
    /// Idempotent: closing an already-closed connection succeeds. An error
    /// indicates the transport failed while closing; the connection is
    /// still considered closed afterwards.
    async fn close(&self) -> Result<(), SessionError>;

    /// Resolves once the transport has reached [`ConnectionState::Closed`].
    /// Resolves immediately if it already has.
    async fn closed(&self);
}
