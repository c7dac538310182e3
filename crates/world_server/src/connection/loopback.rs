//! In-process transport for tests and embedders.

use super::handle::ConnectionHandle;
use async_trait::async_trait;
use session_core::{ConnectionState, SessionError};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// A connection that never touches the network.
///
/// Outbound frames are recorded for inspection, sends can be forced to
/// fail, and the state cell can be driven directly - everything the test
/// suite needs to exercise players, worlds, and dispatch without a socket.
/// Embedders can also use it to attach in-process clients (bots, consoles)
/// to a world.
#[derive(Debug)]
pub struct LoopbackConnection {
    state: AtomicU8,
    sent: Mutex<Vec<String>>,
    fail_sends: AtomicBool,
    closed_tx: watch::Sender<bool>,
}

impl LoopbackConnection {
    /// Creates an open loopback connection.
    pub fn new() -> std::sync::Arc<Self> {
        let (closed_tx, _) = watch::channel(false);
        std::sync::Arc::new(Self {
            state: AtomicU8::new(ConnectionState::Open.as_u8()),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            closed_tx,
        })
    }

    /// Every frame successfully sent through this connection, in order.
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// When set, subsequent sends fail with `ConnectionClosed` without
    /// recording anything.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Drives the state cell directly, waking close observers when the
    /// state becomes `Closed`.
    pub fn force_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
        if state == ConnectionState::Closed {
            let _ = self.closed_tx.send(true);
        }
    }
}

#[async_trait]
impl ConnectionHandle for LoopbackConnection {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        if self.state() != ConnectionState::Open {
            return Err(SessionError::ConnectionClosed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SessionError::ConnectionClosed);
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.force_state(ConnectionState::Closed);
        Ok(())
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
