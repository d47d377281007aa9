//! Privilege tiers for upload scheduling.
//!
//! Peers are split into two tiers:
//! - Privileged (buddies, donors) are drained first
//! - Standard peers are only considered when no privileged upload can start
//!
//! Membership comes from an outside source and is asked fresh on every call.

use std::collections::HashSet;

use crate::domain::PeerId;

/// Membership test for privileged peers.
pub trait PrivilegeSource {
    fn is_privileged(&self, peer: &PeerId) -> bool;
}

impl<F> PrivilegeSource for F
where
    F: Fn(&PeerId) -> bool,
{
    fn is_privileged(&self, peer: &PeerId) -> bool {
        self(peer)
    }
}

/// Nobody is privileged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrivileges;

impl PrivilegeSource for NoPrivileges {
    fn is_privileged(&self, _peer: &PeerId) -> bool {
        false
    }
}

/// Fixed set of privileged peers.
#[derive(Debug, Clone, Default)]
pub struct PrivilegedPeers {
    peers: HashSet<PeerId>,
}

impl PrivilegedPeers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, peer: impl Into<PeerId>) -> bool {
        self.peers.insert(peer.into())
    }

    pub fn remove(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<P: Into<PeerId>> FromIterator<P> for PrivilegedPeers {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            peers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl PrivilegeSource for PrivilegedPeers {
    fn is_privileged(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }
}

/// Priority class of a peer. Earlier tiers are fully drained first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Privileged,
    Standard,
}

impl Tier {
    /// Tiers in the order the scheduler examines them
    pub const ORDER: [Tier; 2] = [Tier::Privileged, Tier::Standard];

    pub fn of(peer: &PeerId, privileges: &dyn PrivilegeSource) -> Self {
        if privileges.is_privileged(peer) {
            Tier::Privileged
        } else {
            Tier::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_privileges() {
        assert!(!NoPrivileges.is_privileged(&PeerId::from("anyone")));
        assert_eq!(Tier::of(&PeerId::from("anyone"), &NoPrivileges), Tier::Standard);
    }

    #[test]
    fn test_privileged_peers() {
        let privileged: PrivilegedPeers = ["puser1", "puser2"].into_iter().collect();
        assert_eq!(privileged.len(), 2);
        assert!(privileged.is_privileged(&PeerId::from("puser1")));
        assert!(!privileged.is_privileged(&PeerId::from("user1")));
        assert_eq!(Tier::of(&PeerId::from("puser2"), &privileged), Tier::Privileged);
    }

    #[test]
    fn test_privileged_peers_mutation() {
        let mut privileged = PrivilegedPeers::new();
        assert!(privileged.is_empty());
        assert!(privileged.insert("buddy"));
        assert!(!privileged.insert("buddy"));
        assert!(privileged.remove(&PeerId::from("buddy")));
        assert!(!privileged.is_privileged(&PeerId::from("buddy")));
    }

    #[test]
    fn test_closure_source() {
        let source = |peer: &PeerId| peer.as_str().starts_with('p');
        assert!(source.is_privileged(&PeerId::from("puser1")));
        assert!(!source.is_privileged(&PeerId::from("user1")));
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(Tier::ORDER[0], Tier::Privileged);
        assert!(Tier::Privileged < Tier::Standard);
    }
}
