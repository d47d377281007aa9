//! Upload candidate selection.
//!
//! `select_candidate` answers one question: given the live uploads, which
//! queued upload should start now? It is a pure read over the transfer set:
//! - A peer already holding a slot is never offered a second one
//! - Privileged peers are drained before standard ones
//! - Within a tier, strict arrival takes the oldest eligible upload, round robin
//!   takes the oldest upload of the peer that has waited longest
//!
//! `None` means nothing should start right now. The caller moves the returned
//! upload into a slot itself.

use std::collections::{HashMap, HashSet};

use crate::domain::{PeerId, Sequence, Transfer};
use crate::scheduler::fairness::FairnessMode;
use crate::scheduler::priority::{PrivilegeSource, Tier};
use crate::store::TransferSet;

/// Pick the next upload to start, if any.
pub fn select_candidate<'a>(
    set: &'a TransferSet,
    privileges: &dyn PrivilegeSource,
    mode: FairnessMode,
) -> Option<&'a Transfer> {
    let busy = busy_peers(set);
    let tiers = peer_tiers(set, privileges);

    for tier in Tier::ORDER {
        let pool = eligible_pool(set, &busy, &tiers, tier);
        if pool.is_empty() {
            continue;
        }

        let candidate = match mode {
            FairnessMode::StrictArrival => pool.first().copied(),
            FairnessMode::RoundRobin => pick_round_robin(set, &pool),
        };

        if let Some(transfer) = candidate {
            debug_assert!(transfer.status.is_queued());
            debug_assert!(!busy.contains(&transfer.peer), "selected busy peer {}", transfer.peer);
            tracing::debug!(
                sequence = %transfer.sequence,
                peer = %transfer.peer,
                ?tier,
                %mode,
                pool = pool.len(),
                "Selected upload candidate"
            );
            return Some(transfer);
        }
    }

    tracing::trace!(busy = busy.len(), "No upload candidate");
    None
}

/// Peers holding a slot anywhere in the set, regardless of tier.
///
/// Also the point where a corrupted set is caught: sequences must be strictly
/// ascending.
pub fn busy_peers(set: &TransferSet) -> HashSet<&PeerId> {
    let mut busy = HashSet::new();
    let mut previous: Option<Sequence> = None;

    for transfer in set.iter_ordered() {
        if let Some(prev) = previous {
            assert!(
                transfer.sequence > prev,
                "upload queue out of order: {} after {}",
                transfer.sequence,
                prev
            );
        }
        previous = Some(transfer.sequence);

        if transfer.status.is_occupying() {
            busy.insert(&transfer.peer);
        }
    }

    busy
}

/// Tier of every peer with a queued upload, asked once per call.
fn peer_tiers<'a>(set: &'a TransferSet, privileges: &dyn PrivilegeSource) -> HashMap<&'a PeerId, Tier> {
    let mut tiers = HashMap::new();
    for transfer in set.iter_ordered().filter(|t| t.status.is_queued()) {
        tiers
            .entry(&transfer.peer)
            .or_insert_with(|| Tier::of(&transfer.peer, privileges));
    }
    tiers
}

/// Queued uploads of `tier` whose peer is not busy, oldest first.
fn eligible_pool<'a>(
    set: &'a TransferSet,
    busy: &HashSet<&PeerId>,
    tiers: &HashMap<&PeerId, Tier>,
    tier: Tier,
) -> Vec<&'a Transfer> {
    set.iter_ordered()
        .filter(|t| t.status.is_queued())
        .filter(|t| !busy.contains(&t.peer))
        .filter(|t| tiers.get(&t.peer) == Some(&tier))
        .collect()
}

/// Round-robin position of a peer; lower goes first.
///
/// A peer waits from the later of its oldest live upload and the last time it
/// was given a slot. Both come from the set's single clock, so two peers never
/// tie. `None` if the peer has no live uploads.
pub fn peer_rank(set: &TransferSet, peer: &PeerId) -> Option<Sequence> {
    let oldest = set
        .iter_ordered()
        .find(|t| &t.peer == peer && !t.status.is_terminal())?
        .sequence;

    Some(match set.service_stamp(peer) {
        Some(stamp) => oldest.max(stamp),
        None => oldest,
    })
}

fn pick_round_robin<'a>(set: &TransferSet, pool: &[&'a Transfer]) -> Option<&'a Transfer> {
    // Pool is oldest first, so the first entry per peer is that peer's oldest queued upload
    let mut heads: Vec<&'a Transfer> = Vec::new();
    let mut seen: HashSet<&PeerId> = HashSet::new();
    for &transfer in pool {
        if seen.insert(&transfer.peer) {
            heads.push(transfer);
        }
    }

    heads
        .into_iter()
        .filter_map(|head| peer_rank(set, &head.peer).map(|rank| (rank, head)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, head)| head)
}
