//! Identity assignment for newly accepted connections.
//!
//! Player identity is external to this crate - a real deployment resolves
//! usernames and tiers from an auth service. The [`IdentityProvider`] seam
//! keeps that collaborator injected; [`GuestIdentity`] is the default used
//! when nothing better is wired in.

use crate::world::PlayerIdentity;
use session_core::Tier;
use std::net::SocketAddr;
use uuid::Uuid;

/// Maps a newly accepted connection to a player identity.
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Assigns an identity to the connection from `remote_addr`.
    fn assign(&self, remote_addr: SocketAddr) -> PlayerIdentity;
}

/// Default provider: anonymous guest names at a fixed tier.
#[derive(Debug, Clone)]
pub struct GuestIdentity {
    tier: Tier,
}

impl GuestIdentity {
    /// Creates a provider that assigns every connection the given tier.
    pub fn new(tier: Tier) -> Self {
        Self { tier }
    }
}

impl IdentityProvider for GuestIdentity {
    fn assign(&self, _remote_addr: SocketAddr) -> PlayerIdentity {
        let suffix = Uuid::new_v4().simple().to_string();
        PlayerIdentity {
            username: format!("guest-{}", &suffix[..8]),
            tier: self.tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_identities_are_unique_and_tiered() {
        let provider = GuestIdentity::new(Tier::Any);
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let a = provider.assign(addr);
        let b = provider.assign(addr);
        assert_ne!(a.username, b.username);
        assert!(a.username.starts_with("guest-"));
        assert_eq!(a.tier, Tier::Any);
    }
}
