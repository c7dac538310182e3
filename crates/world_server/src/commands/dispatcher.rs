//! Command registration and the dispatch state machine.
//!
//! The dispatcher connects a player's `"command"` event to the command
//! table. Registration filters the requested names against the table and
//! the player's tier; dispatch re-authorizes every invocation against a
//! fresh table snapshot, so table edits made after registration are
//! honored.

use crate::commands::table::{CommandEntry, CommandTable};
use crate::messaging::INVALID_COMMAND_REPLY;
use crate::player::{EventHandler, Player};
use futures::FutureExt;
use serde_json::Value;
use session_core::{AsyncExecutor, SessionError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The player event that carries command lines.
pub const COMMAND_EVENT: &str = "command";

/// Routes inbound command lines to table entries for registered players.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<CommandTable>,
    executor: AsyncExecutor,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared command table.
    pub fn new(table: Arc<CommandTable>, executor: AsyncExecutor) -> Self {
        Self { table, executor }
    }

    /// Registers a set of commands for a player and attaches the single
    /// `"command"` subscription that dispatches them.
    ///
    /// # Arguments
    ///
    /// * `player` - The player to register
    /// * `commands` - Names to register; `None` means every command
    ///   currently in the table
    ///
    /// Names absent from the table (`CommandNotFound`) and names whose
    /// required tier is stricter than the player's (`TierExceeded`) are
    /// logged and skipped - never fatal, never surfaced to the player.
    ///
    /// Idempotent: registering again fully replaces both the registered
    /// set and the subscription.
    pub async fn register(&self, player: &Arc<Player>, commands: Option<&[String]>) {
        let requested: Vec<String> = match commands {
            Some(names) => names.to_vec(),
            None => self.table.list().await.keys().cloned().collect(),
        };

        let mut registered = HashSet::new();
        for name in requested {
            match self.table.get(&name).await {
                None => {
                    error!("⚠️ {}, so it was not registered", SessionError::CommandNotFound(name));
                }
                Some(entry) if !entry.tier.permits(player.tier()) => {
                    error!(
                        "⛔ {}",
                        SessionError::TierExceeded {
                            command: name,
                            username: player.username().to_string(),
                        }
                    );
                }
                Some(_) => {
                    info!("📝 Registered {name} command for {}", player.username());
                    registered.insert(name);
                }
            }
        }

        let subscription = self.command_subscription(player, Arc::new(registered));
        player.subscribe(COMMAND_EVENT, subscription).await;
    }

    /// Stops command listening for a player.
    ///
    /// `commands` defaults to every name currently in the table. Any
    /// non-empty effective set detaches the player's entire `"command"`
    /// subscription - this is deliberately not per-command removal. An
    /// explicit empty set detaches nothing.
    pub async fn unregister(&self, player: &Arc<Player>, commands: Option<&[String]>) {
        let targets: Vec<String> = match commands {
            Some(names) => names.to_vec(),
            None => self.table.list().await.keys().cloned().collect(),
        };
        if targets.is_empty() {
            return;
        }
        for name in &targets {
            info!("🗑️ Unregistered {name} command for {}", player.username());
        }
        player.unsubscribe(COMMAND_EVENT).await;
    }

    /// A live snapshot of the command table, so callers can authorize
    /// against current state even while the table mutates mid-session.
    pub async fn list(&self) -> HashMap<String, CommandEntry> {
        self.table.list().await
    }

    /// Builds the `"command"` subscription closure for one player.
    ///
    /// The closure holds the player weakly: once the world drops the
    /// player, pending dispatches become no-ops instead of resurrecting
    /// the session.
    fn command_subscription(
        &self,
        player: &Arc<Player>,
        registered: Arc<HashSet<String>>,
    ) -> EventHandler {
        let table = self.table.clone();
        let executor = self.executor.clone();
        let player = Arc::downgrade(player);

        Arc::new(move |payload: Value| {
            let table = table.clone();
            let executor = executor.clone();
            let registered = registered.clone();
            let player = player.clone();
            async move {
                let Some(player) = player.upgrade() else {
                    return Ok(());
                };
                let Some(line) = payload.as_str() else {
                    return Err(SessionError::MalformedMessage(
                        "command payload must be a string".to_string(),
                    ));
                };
                dispatch(&table, &executor, &registered, &player, line).await
            }
            .boxed()
        })
    }
}

/// Runs one command line through authorization and execution.
async fn dispatch(
    table: &CommandTable,
    executor: &AsyncExecutor,
    registered: &HashSet<String>,
    player: &Arc<Player>,
    line: &str,
) -> Result<(), SessionError> {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<String> = words.map(str::to_string).collect();

    let label = if args.is_empty() {
        format!("[{}] {name}", player.username())
    } else {
        format!("[{}] {name} [{}]", player.username(), args.join(", "))
    };

    // Authorization runs against the table as it is NOW, not as it was at
    // registration time. A name deleted from the table since registration
    // simply fails the check.
    let snapshot = table.list().await;
    let entry = match snapshot.get(name) {
        Some(entry) if registered.contains(name) && entry.tier.permits(player.tier()) => {
            entry.clone()
        }
        _ => {
            info!("{label} => unregistered");
            if let Err(err) = player.send(INVALID_COMMAND_REPLY).await {
                warn!(
                    "⚠️ Could not deliver rejection to {}: {err}",
                    player.username()
                );
            }
            return Ok(());
        }
    };

    let completion = executor.run((entry.handler)(player.clone(), args))?;
    match completion.await {
        Ok(result) if result.is_empty() => info!("{label}"),
        Ok(result) => info!("{label} => {result}"),
        // Already routed to the error sink by the executor.
        Err(_) => {}
    }
    Ok(())
}
