//! # Core Type Definitions
//!
//! Fundamental types used throughout the Outpost session server: player
//! identity, privilege tiers, and connection lifecycle states.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Unique identifier for connected players
//! - [`Tier`] - Integer privilege level, 0 (owner) through 3 (any)
//! - [`ConnectionState`] - Transport lifecycle state

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player in the world.
///
/// This is a wrapper around UUID that provides type safety and ensures
/// player IDs cannot be confused with other kinds of IDs in the system.
///
/// # Examples
///
/// ```rust
/// use session_core::PlayerId;
///
/// let player_id = PlayerId::new();
/// println!("Player ID: {}", player_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from a string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    ///
    /// # Returns
    ///
    /// Returns `Ok(PlayerId)` if the string is a valid UUID, otherwise
    /// `Err(uuid::Error)` with details about the parsing failure.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Privilege tier for players and commands.
///
/// Tiers are ordinary integers on the wire and in configuration: `0` is the
/// most privileged (owner) and `3` the least (any connected player). A
/// command is available to a player when the command's required tier is
/// numerically greater than or equal to the player's tier - see
/// [`Tier::permits`].
///
/// Beyond the 0..=3 range check at the serde boundary there is no
/// validation; callers constructing tiers directly are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Tier {
    /// Tier 0 - world owner.
    Owner = 0,
    /// Tier 1 - administrator.
    Admin = 1,
    /// Tier 2 - moderator.
    Moderator = 2,
    /// Tier 3 - any connected player.
    Any = 3,
}

impl Tier {
    /// Returns true when a command requiring `self` may be invoked by a
    /// player holding `player` privilege.
    ///
    /// The comparison is numeric: a tier-3 command permits everyone, a
    /// tier-0 command permits only the owner.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use session_core::Tier;
    ///
    /// assert!(Tier::Any.permits(Tier::Moderator));
    /// assert!(!Tier::Moderator.permits(Tier::Any));
    /// assert!(Tier::Owner.permits(Tier::Owner));
    /// ```
    pub fn permits(self, player: Tier) -> bool {
        self as u8 >= player as u8
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier as u8
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tier::Owner),
            1 => Ok(Tier::Admin),
            2 => Ok(Tier::Moderator),
            3 => Ok(Tier::Any),
            other => Err(format!("invalid tier {other}, expected 0-3")),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Lifecycle state of a player's underlying transport connection.
///
/// Mirrors the classic socket ready states: a connection is writable only
/// while [`ConnectionState::Open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Fully established; sends are permitted.
    Open,
    /// Close initiated but not yet complete.
    Closing,
    /// Fully closed; the connection will never reopen.
    Closed,
}

impl ConnectionState {
    /// Packs the state into a u8 for storage in an atomic cell.
    pub fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Connecting => 0,
            ConnectionState::Open => 1,
            ConnectionState::Closing => 2,
            ConnectionState::Closed => 3,
        }
    }

    /// Unpacks a state previously stored with [`ConnectionState::as_u8`].
    /// Unknown values map to `Closed`, the terminal state.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}
