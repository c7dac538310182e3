//! The world: the live registry of connected players.
//!
//! The world owns every player for its connected lifetime. A player is in
//! the registry if and only if it has been accepted and not yet removed;
//! removal happens on explicit kick or on the transport's close
//! notification, whichever comes first, and exactly once.

use crate::connection::ConnectionHandle;
use crate::messaging::Outbound;
use crate::player::Player;
use session_core::{AsyncExecutor, ConnectionState, PlayerId, SessionError, Tier};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Notice sent to a player just before their connection is force-closed.
pub const KICK_NOTICE: &str = "You are about to be kicked!";

/// Identity assigned to a player at connection time.
///
/// Sourced from external auth by the caller; the world treats it as given.
#[derive(Debug, Clone)]
pub struct PlayerIdentity {
    /// Display name for logs and dispatch diagnostics.
    pub username: String,
    /// Privilege tier, 0 (owner) through 3 (any).
    pub tier: Tier,
}

/// The live registry of connected players for one server instance.
///
/// Players are kept in insertion order so broadcast iterates a stable
/// sequence. All mutation goes through a single writer lock per
/// operation - a player can never appear twice and a kick can never race
/// a concurrent add of the same player.
#[derive(Debug, Default)]
pub struct World {
    players: RwLock<Vec<Arc<Player>>>,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Arc<Self> {
        info!("🌍 The world is now online");
        Arc::new(Self::default())
    }

    /// Admits a raw connection: wraps it into a [`Player`], inserts it
    /// into the registry, and attaches a close observer that removes the
    /// player exactly once when the transport closes (idempotent against
    /// a manual kick happening first).
    ///
    /// # Returns
    ///
    /// The new player, for further setup - command registration, welcome
    /// message.
    pub async fn accept(
        self: &Arc<Self>,
        connection: Arc<dyn ConnectionHandle>,
        identity: PlayerIdentity,
        executor: AsyncExecutor,
    ) -> Arc<Player> {
        let player = Player::new(identity.username, identity.tier, connection.clone(), executor);
        self.add_player(player.clone()).await;
        info!("🔗 {} connected", player.username());

        let world = Arc::downgrade(self);
        let player_id = player.id();
        tokio::spawn(async move {
            connection.closed().await;
            if let Some(world) = world.upgrade() {
                world.remove(player_id).await;
            }
        });

        player
    }

    /// Inserts a player into the registry. Duplicate-safe: a player
    /// already present is left alone.
    pub async fn add_player(&self, player: Arc<Player>) {
        let mut players = self.players.write().await;
        if players.iter().any(|p| p.id() == player.id()) {
            return;
        }
        players.push(player);
    }

    /// Removes a player from the registry.
    ///
    /// # Returns
    ///
    /// `true` if the player was present, `false` for a no-op.
    pub async fn remove(&self, id: PlayerId) -> bool {
        let mut players = self.players.write().await;
        match players.iter().position(|p| p.id() == id) {
            Some(index) => {
                let player = players.remove(index);
                info!("❌ {} disconnected", player.username());
                true
            }
            None => false,
        }
    }

    /// Kicks a player: removes them from the registry (no-op if already
    /// gone) and, unless the connection is already fully closed, attempts
    /// a courtesy notice before forcing the transport closed.
    ///
    /// Idempotent - kicking a player twice makes the second call a no-op
    /// success. A failure while closing the transport is returned as the
    /// error outcome rather than propagated as a panic; a failed notice is
    /// only reported.
    pub async fn kick(&self, player: &Arc<Player>) -> Result<(), SessionError> {
        self.remove(player.id()).await;

        if player.connection_state() != ConnectionState::Closed {
            info!("👢 Kicking {}", player.username());
            if let Err(err) = player.send(KICK_NOTICE).await {
                warn!("⚠️ Kick notice for {} not delivered: {err}", player.username());
            }
            if let Err(err) = player.connection().close().await {
                error!("❌ Failed to close connection for {}: {err}", player.username());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Delivers a message to each target independently - one target's
    /// send failure is reported and the rest still receive.
    ///
    /// # Arguments
    ///
    /// * `message` - What to send
    /// * `targets` - Recipients; `None` broadcasts to the full registry
    ///
    /// # Returns
    ///
    /// The number of players the message was delivered to.
    pub async fn broadcast(&self, message: Outbound, targets: Option<&[Arc<Player>]>) -> usize {
        let targets: Vec<Arc<Player>> = match targets {
            Some(players) => players.to_vec(),
            None => self.players.read().await.clone(),
        };

        let mut delivered = 0;
        for player in &targets {
            match player.send(message.clone()).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!("⚠️ Broadcast to {} failed: {err}", player.username()),
            }
        }
        debug!("📡 Broadcast delivered to {delivered} of {} players", targets.len());
        delivered
    }

    /// The number of currently connected players.
    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    /// A snapshot of the connected players, in insertion order.
    pub async fn players(&self) -> Vec<Arc<Player>> {
        self.players.read().await.clone()
    }
}
