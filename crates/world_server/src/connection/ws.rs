//! WebSocket transport implementation.
//!
//! Wraps the write half of an accepted WebSocket stream behind the
//! [`ConnectionHandle`] seam. The read half stays with the server's
//! per-connection task, which calls [`WsConnection::mark_closed`] when the
//! stream ends so that close observers fire.

use super::handle::ConnectionHandle;
use async_trait::async_trait;
use futures_util::sink::SinkExt;
use futures_util::stream::SplitSink;
use session_core::{ConnectionState, SessionError};
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::warn;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// A live WebSocket connection to one client.
///
/// The sink is guarded by a mutex so that player sends, ping replies, and
/// the close path serialize their writes. State lives in an atomic cell and
/// close observers wait on a watch channel.
pub struct WsConnection {
    sink: Mutex<WsSink>,
    state: AtomicU8,
    closed_tx: watch::Sender<bool>,
}

impl WsConnection {
    /// Wraps the write half of a freshly accepted WebSocket stream. The
    /// connection starts in the open state - the handshake has already
    /// completed by the time the stream is split.
    pub fn new(sink: WsSink) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            sink: Mutex::new(sink),
            state: AtomicU8::new(ConnectionState::Open.as_u8()),
            closed_tx,
        }
    }

    /// Marks the transport closed and wakes every close observer.
    ///
    /// Called by the connection's read loop when the stream ends, and by
    /// [`ConnectionHandle::close`] once the close frame has been written.
    /// Safe to call more than once.
    pub fn mark_closed(&self) {
        self.state
            .store(ConnectionState::Closed.as_u8(), Ordering::SeqCst);
        let _ = self.closed_tx.send(true);
    }

    /// Replies to a ping frame with the same payload.
    pub async fn pong(&self, data: Bytes) -> Result<(), SessionError> {
        if self.state() != ConnectionState::Open {
            return Err(SessionError::ConnectionClosed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Pong(data))
            .await
            .map_err(|_| SessionError::ConnectionClosed)
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("state", &ConnectionState::from_u8(self.state.load(Ordering::SeqCst)))
            .finish()
    }
}

#[async_trait]
impl ConnectionHandle for WsConnection {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        if self.state() != ConnectionState::Open {
            return Err(SessionError::ConnectionClosed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| {
                warn!("WebSocket send failed: {e}");
                SessionError::ConnectionClosed
            })
    }

    async fn close(&self) -> Result<(), SessionError> {
        if self.state() == ConnectionState::Closed {
            return Ok(());
        }
        self.state
            .store(ConnectionState::Closing.as_u8(), Ordering::SeqCst);

        let result = {
            let mut sink = self.sink.lock().await;
            match sink.send(Message::Close(None)).await {
                Ok(()) => sink.close().await,
                Err(e) => Err(e),
            }
        };

        // The transport is done either way; observers must still fire.
        self.mark_closed();
        result.map_err(|e| {
            warn!("WebSocket close failed: {e}");
            SessionError::ConnectionClosed
        })
    }

    async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}
