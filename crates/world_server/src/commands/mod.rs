//! Tier-gated command table and dispatch.
//!
//! Commands are named, tier-gated async operations invocable by players
//! through a text line. The [`CommandTable`] holds the registrations; the
//! [`Dispatcher`] wires a player's `"command"` subscription to the table
//! and performs call-time authorization against a fresh snapshot.

pub mod dispatcher;
pub mod table;

pub use dispatcher::{Dispatcher, COMMAND_EVENT};
pub use table::{CommandEntry, CommandHandler, CommandTable};
