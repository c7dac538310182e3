//! The command table: name → (required tier, handler).

use crate::player::Player;
use futures::future::BoxFuture;
use session_core::{SessionError, Tier};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// An async command implementation.
///
/// Invoked with the calling player and the whitespace-tokenized argument
/// list. The returned string is diagnostic only - it appears in the
/// dispatch log (omitted when empty) and is NOT sent to the player.
/// Handlers that want to respond call
/// [`Player::send`](crate::player::Player::send) themselves.
pub type CommandHandler =
    Arc<dyn Fn(Arc<Player>, Vec<String>) -> BoxFuture<'static, Result<String, SessionError>> + Send + Sync>;

/// One command registration: the tier it demands and its handler.
#[derive(Clone)]
pub struct CommandEntry {
    /// Minimum privilege required to invoke the command. Numeric
    /// comparison only; the range is not validated here.
    pub tier: Tier,
    /// The operation to run when the command is dispatched.
    pub handler: CommandHandler,
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry").field("tier", &self.tier).finish()
    }
}

/// Shared mapping of command name to [`CommandEntry`].
///
/// Read-mostly after startup. Writes go through a single writer lock;
/// readers take copy-on-read snapshots via [`CommandTable::list`], so
/// concurrent mutation during iteration can never yield a torn read.
#[derive(Debug, Default)]
pub struct CommandTable {
    entries: RwLock<HashMap<String, CommandEntry>>,
}

impl CommandTable {
    /// Creates an empty command table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a command, overwriting any existing entry with the same
    /// name. Duplicate registration overwriting rather than erroring is a
    /// deliberate policy, not an accident.
    pub async fn add(&self, name: impl Into<String>, tier: Tier, handler: CommandHandler) {
        let name = name.into();
        let mut entries = self.entries.write().await;
        let replaced = entries
            .insert(name.clone(), CommandEntry { tier, handler })
            .is_some();
        if replaced {
            info!("♻️ Replaced {name} command (tier {tier})");
        } else {
            info!("➕ Added {name} command (tier {tier})");
        }
    }

    /// Looks up a single command.
    pub async fn get(&self, name: &str) -> Option<CommandEntry> {
        self.entries.read().await.get(name).cloned()
    }

    /// Returns a fresh snapshot of the whole table.
    ///
    /// Taken anew on every call, never a cached reference: mutating the
    /// table afterwards does not change a snapshot already handed out.
    pub async fn list(&self) -> HashMap<String, CommandEntry> {
        self.entries.read().await.clone()
    }
}
