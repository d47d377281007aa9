//! Queue position estimates.
//!
//! Peers ask where their upload stands in our queue. The answer assumes the
//! current queue drains with nothing new arriving and nobody busy, so it is an
//! estimate, not a promise.

use std::collections::HashMap;

use crate::domain::{PeerId, Sequence};
use crate::scheduler::fairness::FairnessMode;
use crate::scheduler::priority::{PrivilegeSource, Tier};
use crate::scheduler::select::peer_rank;
use crate::store::TransferSet;

/// 1-based number of starts up to and including this upload.
///
/// `None` if the sequence is unknown or the upload is not queued.
pub fn queue_position(
    set: &TransferSet,
    privileges: &dyn PrivilegeSource,
    mode: FairnessMode,
    sequence: Sequence,
) -> Option<usize> {
    let target = set.get(sequence)?;
    if !target.status.is_queued() {
        return None;
    }

    let tier = Tier::of(&target.peer, privileges);

    // Queued uploads per peer, split by tier
    let mut queued: HashMap<&PeerId, (Tier, usize)> = HashMap::new();
    for transfer in set.iter_ordered().filter(|t| t.status.is_queued()) {
        queued
            .entry(&transfer.peer)
            .or_insert_with(|| (Tier::of(&transfer.peer, privileges), 0))
            .1 += 1;
    }

    let higher_tiers: usize = queued
        .values()
        .filter(|(peer_tier, _)| *peer_tier < tier)
        .map(|(_, count)| count)
        .sum();

    let same_tier = match mode {
        FairnessMode::StrictArrival => set
            .iter_ordered()
            .take_while(|t| t.sequence < sequence)
            .filter(|t| t.status.is_queued())
            .filter(|t| queued.get(&t.peer).map(|(peer_tier, _)| *peer_tier) == Some(tier))
            .count(),
        FairnessMode::RoundRobin => {
            // Files of this peer that go before the target
            let k = set
                .queued_for(&target.peer)
                .take_while(|t| t.sequence < sequence)
                .count();
            let own_rank = peer_rank(set, &target.peer);

            let others: usize = queued
                .iter()
                .filter(|(peer, (peer_tier, _))| **peer != &target.peer && *peer_tier == tier)
                .map(|(peer, (_, count))| {
                    let turns = if peer_rank(set, peer) < own_rank { k + 1 } else { k };
                    turns.min(*count)
                })
                .sum();
            k + others
        }
    };

    Some(higher_tiers + same_tier + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransferStatus;
    use crate::scheduler::priority::{NoPrivileges, PrivilegedPeers};

    fn queue(peers: &[&str]) -> TransferSet {
        let mut set = TransferSet::new();
        for (i, peer) in peers.iter().enumerate() {
            set.append(*peer, format!("{}/{}", peer, i));
        }
        set
    }

    #[test]
    fn test_strict_arrival_position() {
        let set = queue(&["user1", "user1", "user2", "user3"]);
        let position = |seq| queue_position(&set, &NoPrivileges, FairnessMode::StrictArrival, Sequence(seq));
        assert_eq!(position(0), Some(1));
        assert_eq!(position(2), Some(3));
        assert_eq!(position(3), Some(4));
    }

    #[test]
    fn test_round_robin_position() {
        // Turn order: user1, user2, user3, user1, user1
        let set = queue(&["user1", "user1", "user1", "user2", "user3"]);
        let position = |seq| queue_position(&set, &NoPrivileges, FairnessMode::RoundRobin, Sequence(seq));
        assert_eq!(position(0), Some(1));
        assert_eq!(position(3), Some(2));
        assert_eq!(position(4), Some(3));
        assert_eq!(position(1), Some(4));
        assert_eq!(position(2), Some(5));
    }

    #[test]
    fn test_standard_upload_waits_for_privileged() {
        let set = queue(&["user1", "puser1", "puser1"]);
        let privileged: PrivilegedPeers = ["puser1"].into_iter().collect();
        for mode in [FairnessMode::StrictArrival, FairnessMode::RoundRobin] {
            assert_eq!(queue_position(&set, &privileged, mode, Sequence(0)), Some(3));
            assert_eq!(queue_position(&set, &privileged, mode, Sequence(1)), Some(1));
        }
    }

    #[test]
    fn test_position_of_unknown_or_active_upload() {
        let mut set = queue(&["user1", "user2"]);
        set.update_status(Sequence(0), TransferStatus::Transferring).unwrap();
        assert_eq!(queue_position(&set, &NoPrivileges, FairnessMode::RoundRobin, Sequence(0)), None);
        assert_eq!(queue_position(&set, &NoPrivileges, FairnessMode::RoundRobin, Sequence(9)), None);
        assert_eq!(queue_position(&set, &NoPrivileges, FairnessMode::RoundRobin, Sequence(1)), Some(1));
    }
}
