//! Core world server implementation.
//!
//! This module contains the main [`WorldServer`] struct, which binds the
//! listener, runs the accept loop, and wires each accepted connection into
//! the world registry and command dispatcher.

use crate::{
    commands::{CommandTable, Dispatcher},
    config::ServerConfig,
    error::ServerError,
    server::handlers::handle_connection,
    server::identity::{GuestIdentity, IdentityProvider},
    world::World,
};
use session_core::{AsyncExecutor, ShutdownState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, trace, warn};

/// The core session server.
///
/// Owns the shared pieces - world registry, command table, dispatcher,
/// executor - and runs the accept loop that admits clients. Command
/// handlers are supplied externally by loading them into the
/// [`CommandTable`] before traffic begins; the server itself carries no
/// command implementations.
#[derive(Debug)]
pub struct WorldServer {
    /// Server configuration settings
    config: ServerConfig,

    /// The live player registry
    world: Arc<World>,

    /// Shared command table, loaded by the embedder at startup
    table: Arc<CommandTable>,

    /// Per-player command registration and dispatch
    dispatcher: Arc<Dispatcher>,

    /// Deferred-execution wrapper shared by every dispatch site
    executor: AsyncExecutor,

    /// Identity assignment for new connections
    identity: Arc<dyn IdentityProvider>,
}

impl WorldServer {
    /// Creates a world server around an externally supplied command table.
    ///
    /// The table may still be extended after construction, but should be
    /// fully loaded before traffic begins.
    pub fn new(config: ServerConfig, table: Arc<CommandTable>) -> Self {
        let executor = AsyncExecutor::new();
        let world = World::new();
        let dispatcher = Arc::new(Dispatcher::new(table.clone(), executor.clone()));
        let identity = Arc::new(GuestIdentity::new(config.default_tier));

        Self {
            config,
            world,
            table,
            dispatcher,
            executor,
            identity,
        }
    }

    /// Replaces the identity provider, for deployments with a real auth
    /// collaborator.
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// The live player registry.
    pub fn world(&self) -> Arc<World> {
        self.world.clone()
    }

    /// The shared command table.
    pub fn command_table(&self) -> Arc<CommandTable> {
        self.table.clone()
    }

    /// The shared executor.
    pub fn executor(&self) -> AsyncExecutor {
        self.executor.clone()
    }

    /// Starts the server and accepts connections until the process ends.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    /// Starts the server with graceful-shutdown support: the accept loop
    /// stops once `shutdown_state` reports shutdown initiated.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting world server on {}", self.config.bind_address);

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address))
            })?;

        info!("🎮 Ready to accept connections");

        loop {
            let accepted = match &shutdown_state {
                Some(state) => {
                    if state.is_shutdown_initiated() {
                        break;
                    }
                    tokio::select! {
                        accepted = listener.accept() => Some(accepted),
                        _ = wait_for_shutdown(state.clone()) => None,
                    }
                }
                None => Some(listener.accept().await),
            };

            let Some(accepted) = accepted else { break };
            match accepted {
                Ok((stream, addr)) => {
                    if self.world.player_count().await >= self.config.max_connections {
                        warn!("🚫 Refusing connection from {addr}: server is full");
                        continue;
                    }

                    let world = self.world.clone();
                    let dispatcher = self.dispatcher.clone();
                    let executor = self.executor.clone();
                    let identity = self.identity.clone();
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, addr, world, dispatcher, executor, identity, config)
                                .await
                        {
                            trace!("Connection from {addr} ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Accept failed: {e}");
                }
            }
        }

        info!("🛑 Accept loop stopped");
        Ok(())
    }
}

/// Resolves once shutdown is initiated. Polling keeps the shutdown state a
/// plain pair of atomics shareable with the signal handler.
async fn wait_for_shutdown(state: ShutdownState) {
    while !state.is_shutdown_initiated() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
