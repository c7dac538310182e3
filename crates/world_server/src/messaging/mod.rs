//! Message framing for client-server communication.
//!
//! Inbound traffic is a stream of text frames, each containing one JSON
//! object mapping event names to payloads. Outbound traffic is plain text
//! or a JSON-encoded structured value, one frame per send.

pub mod types;

pub use types::{decode_frame, InboundFrame, Outbound, INVALID_COMMAND_REPLY};
