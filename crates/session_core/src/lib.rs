//! # Session Core - Shared Session Infrastructure
//!
//! Leaf infrastructure for the Outpost session server. This crate contains
//! the pieces every other component builds on:
//!
//! * **Core types** - [`PlayerId`], [`Tier`], and [`ConnectionState`]
//! * **Error taxonomy** - [`SessionError`], the single error enum shared by
//!   the player registry, the command dispatcher, and the transport layer
//! * **Async execution** - [`AsyncExecutor`], the uniform deferred-execution
//!   wrapper that isolates handler failures behind an [`ErrorSink`]
//! * **Shutdown coordination** - [`ShutdownState`] for graceful stop
//!
//! ## Design Principles
//!
//! * **Type Safety**: wrapper types prevent ID confusion and keep privilege
//!   comparisons explicit
//! * **Failure Isolation**: nothing a command handler does can crash the
//!   process; faults are routed to a configurable sink
//! * **Explicit Asynchrony**: only operations handed to the executor are
//!   deferred - there is no implicit wrapping of ordinary functions

pub use error::SessionError;
pub use exec::{default_error_sink, AsyncExecutor, Completion, ErrorSink, LogErrorSink};
pub use shutdown::ShutdownState;
pub use types::{ConnectionState, PlayerId, Tier};
pub use utils::current_timestamp;

pub mod error;
pub mod exec;
pub mod shutdown;
pub mod types;
pub mod utils;
