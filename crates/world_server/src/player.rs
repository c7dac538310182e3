//! Player representation and per-player event delivery.
//!
//! A [`Player`] is one connected client: identity, privilege tier, a set of
//! named event subscriptions, and exclusive ownership of the underlying
//! connection. The [`World`](crate::world::World) owns the player for its
//! connected lifetime; only the dispatcher mutates subscriptions, and only
//! message delivery invokes them.

use crate::connection::ConnectionHandle;
use crate::messaging::{decode_frame, Outbound};
use futures::future::BoxFuture;
use serde_json::Value;
use session_core::{AsyncExecutor, ConnectionState, PlayerId, SessionError, Tier};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Handler attached to a player event via [`Player::subscribe`].
///
/// Receives the event's payload from the inbound frame. Handlers run
/// through the [`AsyncExecutor`], never inline with frame delivery.
pub type EventHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<(), SessionError>> + Send + Sync>;

/// One connected client session.
///
/// # Lifecycle
///
/// Created by [`World::accept`](crate::world::World::accept) when a
/// connection is admitted; removed from the world on explicit kick or on
/// the transport's close notification, whichever occurs first. The player
/// is never dispatched-to after removal - dispatch paths hold weak
/// references and drop the work once the player is gone.
pub struct Player {
    id: PlayerId,
    username: String,
    tier: Tier,
    /// The transport, exclusively owned; the player closes it.
    connection: Arc<dyn ConnectionHandle>,
    /// Event name → handler. Single handler per event: subscribing again
    /// overwrites.
    subscriptions: RwLock<HashMap<String, EventHandler>>,
    executor: AsyncExecutor,
}

impl Player {
    /// Creates a player around an accepted connection.
    ///
    /// Identity is injected by the caller - assignment happens at
    /// connection time and is sourced from external auth, not from this
    /// crate.
    pub fn new(
        username: impl Into<String>,
        tier: Tier,
        connection: Arc<dyn ConnectionHandle>,
        executor: AsyncExecutor,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: PlayerId::new(),
            username: username.into(),
            tier,
            connection,
            subscriptions: RwLock::new(HashMap::new()),
            executor,
        })
    }

    /// The player's unique ID, assigned at connection time.
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// The player's display name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The player's privilege tier.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Current state of the underlying connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The underlying connection handle.
    pub fn connection(&self) -> Arc<dyn ConnectionHandle> {
        self.connection.clone()
    }

    /// Sends a message to the player.
    ///
    /// Text passes through verbatim; structured values are JSON-encoded.
    /// Fails with `ConnectionClosed` unless the connection is open. The
    /// error is returned rather than raised so that callers delivering to
    /// many players (broadcast) can report it and continue.
    pub async fn send(&self, message: impl Into<Outbound>) -> Result<(), SessionError> {
        if self.connection.state() != ConnectionState::Open {
            return Err(SessionError::ConnectionClosed);
        }
        let text = message.into().into_frame_text();
        self.connection.send_text(&text).await?;
        debug!("[{}] <= {text}", self.username);
        Ok(())
    }

    /// Registers a handler for an event name, replacing any existing
    /// handler for that name.
    pub async fn subscribe(&self, event: impl Into<String>, handler: EventHandler) {
        self.subscriptions.write().await.insert(event.into(), handler);
    }

    /// Removes the handler for an event name. Delivery of that event
    /// becomes a no-op thereafter.
    pub async fn unsubscribe(&self, event: &str) {
        self.subscriptions.write().await.remove(event);
    }

    /// Entry point for the connection layer: one raw inbound frame.
    ///
    /// The frame is parsed as an event mapping; for each key with a
    /// subscribed handler, the handler runs through the executor with the
    /// key's payload. Unmatched keys are silently ignored. Nothing is
    /// written to the connection synchronously from this path.
    ///
    /// # Returns
    ///
    /// `Err(MalformedMessage)` when the frame fails to parse - the frame
    /// is dropped and reported, the connection stays open. A scheduling
    /// failure is fatal to the delivery and propagates.
    pub async fn on_message(&self, raw: &str) -> Result<(), SessionError> {
        let frame = match decode_frame(raw) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("[{}] dropped frame: {err}", self.username);
                return Err(err);
            }
        };

        let subscriptions = self.subscriptions.read().await;
        for (event, payload) in frame {
            if let Some(handler) = subscriptions.get(&event) {
                // Delivery only schedules the handler; nothing here waits
                // on its completion.
                let _completion = self.executor.run(handler(payload))?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("tier", &self.tier)
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::LoopbackConnection;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_handler(counter: Arc<AtomicUsize>) -> EventHandler {
        Arc::new(move |_payload| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_fails_on_non_open_connection() {
        let conn = LoopbackConnection::new();
        let player = Player::new("tester", Tier::Any, conn.clone(), AsyncExecutor::new());

        conn.force_state(ConnectionState::Closing);
        let err = player.send("hello").await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectionClosed));
        assert!(conn.sent_frames().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_frame_is_dropped_without_closing() {
        let conn = LoopbackConnection::new();
        let player = Player::new("tester", Tier::Any, conn.clone(), AsyncExecutor::new());

        let err = player.on_message("{broken").await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedMessage(_)));
        assert_eq!(player.connection_state(), ConnectionState::Open);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unmatched_events_are_ignored() {
        let conn = LoopbackConnection::new();
        let player = Player::new("tester", Tier::Any, conn.clone(), AsyncExecutor::new());
        let hits = Arc::new(AtomicUsize::new(0));
        player.subscribe("command", counting_handler(hits.clone())).await;

        player
            .on_message(r#"{ "command": "kick", "unknown": 1 }"#)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribe_overwrites_and_unsubscribe_silences() {
        let conn = LoopbackConnection::new();
        let player = Player::new("tester", Tier::Any, conn.clone(), AsyncExecutor::new());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        player.subscribe("command", counting_handler(first.clone())).await;
        player.subscribe("command", counting_handler(second.clone())).await;
        player.on_message(r#"{ "command": "x" }"#).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        player.unsubscribe("command").await;
        player.on_message(r#"{ "command": "x" }"#).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
