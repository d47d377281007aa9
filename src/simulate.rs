//! Queue replay.
//!
//! Drains a queue the way a client with one free slot per step would: each
//! step asks for a candidate and ends one in-flight upload, either before or
//! after asking. Used by the `simulate` command and to pin down scheduling
//! behaviour in tests.

use std::collections::VecDeque;

use crate::domain::{PeerId, Sequence, TransferStatus};
use crate::error::Result;
use crate::scheduler::{FairnessMode, PrivilegedPeers, TransferManager, TransferManagerConfig};
use crate::store::TransferSet;

/// Consecutive empty steps after which the replay gives up
pub const MAX_CONSECUTIVE_NONE: usize = 2;

/// Starting state of a replay.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    /// One queued upload per entry, in arrival order
    pub queued: Vec<String>,
    /// Peers with an upload already in flight, appended after the queue
    pub in_progress: Vec<String>,
    pub privileged: Vec<String>,
    pub mode: FairnessMode,
    /// End the oldest in-flight upload before asking for a candidate instead of after
    pub clear_first: bool,
}

/// Run the drain loop; `None` entries are steps where nothing could start.
pub fn replay(scenario: &Scenario) -> Result<Vec<Option<PeerId>>> {
    let mut set = TransferSet::new();
    for peer in &scenario.queued {
        let path = format!("{}/{}", peer, set.len());
        set.append(peer.as_str(), path);
    }

    let mut in_progress: VecDeque<Sequence> = VecDeque::new();
    for peer in &scenario.in_progress {
        let path = format!("{}/{}", peer, set.len());
        in_progress.push_back(set.append_with_status(peer.as_str(), path, TransferStatus::GettingStatus));
    }

    let privileged: PrivilegedPeers = scenario.privileged.iter().map(String::as_str).collect();
    let mut manager = TransferManager::with_transfers(
        TransferManagerConfig::default().with_fairness(scenario.mode),
        set,
    )
    .with_privileges(privileged);

    let mut steps = Vec::new();
    let mut none_count = 0;

    while !manager.transfers().is_empty() && none_count < MAX_CONSECUTIVE_NONE {
        if scenario.clear_first
            && let Some(done) = in_progress.pop_front()
        {
            manager.finish(done, TransferStatus::Finished)?;
        }

        let candidate = manager.next_candidate().map(|t| (t.sequence, t.peer.clone()));

        if !scenario.clear_first
            && let Some(done) = in_progress.pop_front()
        {
            manager.finish(done, TransferStatus::Finished)?;
        }

        let Some((sequence, peer)) = candidate else {
            none_count += 1;
            steps.push(None);
            continue;
        };

        none_count = 0;
        manager.set_status(sequence, TransferStatus::GettingStatus)?;
        in_progress.push_back(sequence);
        steps.push(Some(peer));
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: Vec<Option<PeerId>>) -> Vec<Option<String>> {
        steps.into_iter().map(|s| s.map(|p| p.to_string())).collect()
    }

    #[test]
    fn test_replay_empty_queue() {
        let steps = replay(&Scenario::default()).unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_replay_single_upload() {
        let scenario = Scenario {
            queued: vec!["user1".to_string()],
            ..Scenario::default()
        };
        let steps = names(replay(&scenario).unwrap());
        assert_eq!(steps, vec![Some("user1".to_string()), None]);
    }

    #[test]
    fn test_replay_only_in_progress() {
        let scenario = Scenario {
            in_progress: vec!["user1".to_string()],
            ..Scenario::default()
        };
        let steps = names(replay(&scenario).unwrap());
        assert_eq!(steps, vec![None]);
    }
}
