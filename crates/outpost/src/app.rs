//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates server
//! startup, the built-in command bootstrap, signal-driven shutdown, and
//! final reporting.

use crate::{cli::CliArgs, commands, config::AppConfig, logging::display_banner, signals::setup_signal_handlers};
use session_core::ShutdownState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use world_server::{world::World, WorldServer};

/// Manages the complete lifecycle of the Outpost server: configuration
/// loading, command bootstrap, server orchestration, and graceful
/// shutdown handling.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// World server instance
    server: WorldServer,
    /// The live player registry, kept for shutdown reporting
    world: Arc<World>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings,
    /// builds the command table with the built-in store, and initializes
    /// the world server.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Build the command table and install built-in commands
    /// 6. Initialize the world server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }
        if let Some(tier) = args.default_tier {
            config.commands.default_tier = tier;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let table = Arc::new(world_server::commands::CommandTable::new());
        let server = WorldServer::new(server_config, table);
        let world = server.world();

        // Command handlers are injected before traffic begins.
        commands::install_builtin_commands(&server.command_table(), world.clone()).await;

        info!("🚀 Outpost Session Server");
        info!("📂 Config: {}", args.config_path.display());

        Ok(Self { config, server, world })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Starts the server in the background, waits for SIGINT/SIGTERM,
    /// initiates coordinated shutdown, and reports final statistics.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let shutdown_state = ShutdownState::new();
        let shutdown_state_for_server = shutdown_state.clone();
        let world = self.world.clone();

        let server_handle = {
            let server = self.server;
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state_for_server).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {e:?}");
                        std::process::exit(1);
                    }
                }
            })
        };

        info!("✅ Outpost is now running!");
        info!("🎮 Ready to accept connections on {}", self.config.server.bind_address);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal, then propagate it to the accept loop.
        let signal_shutdown_state = setup_signal_handlers().await?;
        if signal_shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        // Give the accept loop a moment to notice and stop.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let remaining = world.player_count().await;
        if remaining > 0 {
            info!("👥 {remaining} player(s) still connected at shutdown");
        }

        server_handle.abort();
        match tokio::time::timeout(Duration::from_secs(5), server_handle).await {
            Ok(_) => info!("✅ Server task stopped"),
            Err(e) => warn!("⏰ Server task did not stop within timeout: {e:?}"),
        }

        shutdown_state.complete_shutdown();

        info!("✅ Outpost shutdown complete");
        info!("👋 Thank you for using Outpost!");

        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  ⏱️ Handshake timeout: {}s", self.config.server.connection_timeout);
        info!("  🎚️ Default tier: {}", self.config.commands.default_tier);
        if self.config.commands.allowlist.is_empty() {
            info!("  📜 Command allowlist: all commands");
        } else {
            info!("  📜 Command allowlist: {:?}", self.config.commands.allowlist);
        }
    }
}
