//! Frame codec types for client-server communication.
//!
//! # Inbound
//!
//! One text frame carries one JSON object; each key is an event name and
//! its value the event payload. A frame may carry several events:
//!
//! ```json
//! { "command": "kick player1", "say": "hi" }
//! ```
//!
//! # Outbound
//!
//! [`Outbound::Text`] passes through verbatim; [`Outbound::Json`] is
//! JSON-encoded. Either way the receiver sees a single text frame.

use serde_json::Value;
use session_core::SessionError;

/// Canonical reply for any dispatch-time authorization failure. The same
/// string covers unknown commands and insufficient tier, so clients cannot
/// probe for command existence.
pub const INVALID_COMMAND_REPLY: &str = "Invalid command.";

/// A decoded inbound frame: event name → payload.
pub type InboundFrame = serde_json::Map<String, Value>;

/// Parses one raw text frame into an event mapping.
///
/// # Returns
///
/// The event map, or `SessionError::MalformedMessage` when the frame is
/// not valid JSON or the JSON is not an object. Malformed frames are
/// dropped by the caller; the connection stays open.
pub fn decode_frame(text: &str) -> Result<InboundFrame, SessionError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SessionError::MalformedMessage(format!(
            "expected an event mapping, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(SessionError::MalformedMessage(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// An outbound message: raw text passes through, structured values are
/// JSON-encoded at send time.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Sent verbatim as one text frame.
    Text(String),
    /// JSON-encoded, then sent as one text frame.
    Json(Value),
}

impl Outbound {
    /// Serializes the message into the text that goes on the wire.
    pub fn into_frame_text(self) -> String {
        match self {
            Outbound::Text(text) => text,
            Outbound::Json(value) => value.to_string(),
        }
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Outbound::Text(text.to_string())
    }
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Outbound::Text(text)
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Outbound::Json(value)
    }
}
