//! Built-in command store.
//!
//! The handlers shipped with the server. Everything a handler needs is
//! injected at construction time - the world registry and the command
//! table arrive as explicit references, never as late-bound globals.
//!
//! Handler return values are diagnostic only (they show up in the dispatch
//! log); anything meant for the player is sent through `Player::send`.

use futures::FutureExt;
use serde_json::json;
use session_core::Tier;
use std::sync::Arc;
use tracing::info;
use world_server::commands::CommandTable;
use world_server::messaging::Outbound;
use world_server::world::World;

/// Loads the built-in commands into the table.
///
/// * `kickme` (tier 2) - removes the caller from the world
/// * `players` (tier 3) - sends the caller the current player count
/// * `commands` (tier 3) - sends the caller the names in the table
pub async fn install_builtin_commands(table: &Arc<CommandTable>, world: Arc<World>) {
    {
        let world = world.clone();
        table
            .add(
                "kickme",
                Tier::Moderator,
                Arc::new(move |caller, _args| {
                    let world = world.clone();
                    async move {
                        world.kick(&caller).await?;
                        Ok(String::new())
                    }
                    .boxed()
                }),
            )
            .await;
    }

    {
        let world = world.clone();
        table
            .add(
                "players",
                Tier::Any,
                Arc::new(move |caller, _args| {
                    let world = world.clone();
                    async move {
                        let count = world.player_count().await;
                        caller.send(Outbound::Json(json!(count))).await?;
                        Ok(count.to_string())
                    }
                    .boxed()
                }),
            )
            .await;
    }

    {
        let table_ref = table.clone();
        table
            .add(
                "commands",
                Tier::Any,
                Arc::new(move |caller, _args| {
                    let table = table_ref.clone();
                    async move {
                        let mut available: Vec<String> =
                            table.list().await.keys().cloned().collect();
                        available.sort();
                        caller.send(Outbound::Json(json!(available))).await?;
                        Ok(available.join(", "))
                    }
                    .boxed()
                }),
            )
            .await;
    }

    info!("🧰 Built-in commands installed");
}
