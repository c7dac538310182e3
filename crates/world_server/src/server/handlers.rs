//! Per-connection handling: handshake, registration, read loop, cleanup.

use crate::{
    commands::Dispatcher,
    config::ServerConfig,
    connection::WsConnection,
    error::ServerError,
    server::identity::IdentityProvider,
    world::World,
};
use futures_util::StreamExt;
use session_core::AsyncExecutor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, trace};

/// Handles a single client connection from handshake to cleanup.
///
/// # Connection Flow
///
/// 1. WebSocket handshake (bounded by the configured timeout)
/// 2. Identity assignment and admission into the world
/// 3. Command registration per the configured allow-list
/// 4. Sequential read loop - one player's frames are delivered in arrival
///    order; handler completions may still interleave since execution is
///    deferred
/// 5. Close marking on exit, which fires the world's close observer and
///    removes the player
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    world: Arc<World>,
    dispatcher: Arc<Dispatcher>,
    executor: AsyncExecutor,
    identity: Arc<dyn IdentityProvider>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let handshake = tokio::time::timeout(
        Duration::from_secs(config.connection_timeout),
        accept_async(stream),
    )
    .await
    .map_err(|_| ServerError::Network(format!("WebSocket handshake with {addr} timed out")))?
    .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (ws_sender, mut ws_receiver) = handshake.split();
    let connection = Arc::new(WsConnection::new(ws_sender));

    let player = world
        .accept(connection.clone(), identity.assign(addr), executor)
        .await;
    dispatcher
        .register(&player, config.command_allowlist.as_deref())
        .await;
    debug!("🎮 {} ready on {addr}", player.username());

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = player.on_message(&text).await {
                    trace!("❌ Frame from {} dropped: {e}", player.username());
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = connection.pong(data).await;
            }
            Ok(Message::Close(_)) => {
                debug!("🔌 {} requested close", player.username());
                break;
            }
            Err(e) => {
                error!("WebSocket error for {}: {e}", player.username());
                break;
            }
            _ => {}
        }
    }

    // Fires the close observer attached in World::accept, which removes
    // the player (a no-op if a kick got there first).
    connection.mark_closed();
    Ok(())
}
