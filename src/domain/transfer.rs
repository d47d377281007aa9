//! Transfer record and related types
//!
//! A Transfer is one requested file upload to one peer. Its `sequence` is the
//! arrival index handed out by the owning transfer set and is the only ordering
//! the scheduler relies on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque peer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PeerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Monotonic arrival index. Unique within a transfer set, never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The tick following this one
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a status relates to upload slots. The scheduler sees nothing finer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Waiting for a slot
    Queued,
    /// In flight, holds the peer's single slot
    Occupying,
    /// Done one way or another, about to leave the set
    Terminal,
}

/// Status of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Accepted and waiting for a slot
    Queued,
    /// Asking the peer whether it still wants the file
    GettingStatus,
    /// Opening the file connection
    Connecting,
    /// Bytes are flowing
    Transferring,
    /// Transfer done, checking the result
    Verifying,
    /// Completed successfully
    Finished,
    /// Cancelled by either side
    Cancelled,
    /// Gave up after an error
    Failed,
    /// Peer disconnected before the transfer could finish
    PeerOffline,
}

impl TransferStatus {
    /// Collapse into the three states the scheduler distinguishes
    pub fn slot_state(&self) -> SlotState {
        match self {
            TransferStatus::Queued => SlotState::Queued,
            TransferStatus::GettingStatus
            | TransferStatus::Connecting
            | TransferStatus::Transferring
            | TransferStatus::Verifying => SlotState::Occupying,
            TransferStatus::Finished
            | TransferStatus::Cancelled
            | TransferStatus::Failed
            | TransferStatus::PeerOffline => SlotState::Terminal,
        }
    }

    pub fn is_queued(&self) -> bool {
        self.slot_state() == SlotState::Queued
    }

    pub fn is_occupying(&self) -> bool {
        self.slot_state() == SlotState::Occupying
    }

    pub fn is_terminal(&self) -> bool {
        self.slot_state() == SlotState::Terminal
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferStatus::Queued => "Queued",
            TransferStatus::GettingStatus => "Getting status",
            TransferStatus::Connecting => "Connecting",
            TransferStatus::Transferring => "Transferring",
            TransferStatus::Verifying => "Verifying",
            TransferStatus::Finished => "Finished",
            TransferStatus::Cancelled => "Cancelled",
            TransferStatus::Failed => "Failed",
            TransferStatus::PeerOffline => "Peer offline",
        };
        f.write_str(label)
    }
}

/// One upload of one file to one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub peer: PeerId,
    /// Identifies the file within the peer's requests; never interpreted
    pub path: String,
    pub status: TransferStatus,
    pub sequence: Sequence,
}

impl Transfer {
    /// Create a queued transfer
    pub fn new(peer: impl Into<PeerId>, path: impl Into<String>, sequence: Sequence) -> Self {
        Self {
            peer: peer.into(),
            path: path.into(),
            status: TransferStatus::Queued,
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transfer_is_queued() {
        let transfer = Transfer::new("user1", "music/song.flac", Sequence(0));
        assert_eq!(transfer.status, TransferStatus::Queued);
        assert_eq!(transfer.peer.as_str(), "user1");
        assert!(transfer.status.is_queued());
    }

    #[test]
    fn test_in_flight_statuses_occupy_a_slot() {
        for status in [
            TransferStatus::GettingStatus,
            TransferStatus::Connecting,
            TransferStatus::Transferring,
            TransferStatus::Verifying,
        ] {
            assert_eq!(status.slot_state(), SlotState::Occupying, "{status}");
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn test_terminal_statuses() {
        for status in [
            TransferStatus::Finished,
            TransferStatus::Cancelled,
            TransferStatus::Failed,
            TransferStatus::PeerOffline,
        ] {
            assert!(status.is_terminal(), "{status}");
            assert!(!status.is_occupying());
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TransferStatus::GettingStatus).unwrap();
        assert_eq!(json, "\"getting_status\"");
        let status: TransferStatus = serde_json::from_str("\"peer_offline\"").unwrap();
        assert_eq!(status, TransferStatus::PeerOffline);
    }

    #[test]
    fn test_sequence_ordering_and_display() {
        assert!(Sequence(1) < Sequence(2));
        assert_eq!(Sequence(4).next(), Sequence(5));
        assert_eq!(Sequence(9).to_string(), "#9");
    }
}
