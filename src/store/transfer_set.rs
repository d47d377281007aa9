//! Insertion-ordered set of live uploads.
//!
//! Records are kept in ascending `sequence` order. Sequences come from a single
//! monotonic counter that also stamps a peer each time one of its transfers is
//! moved into a slot, so arrival order and service order share one clock.

use std::collections::HashMap;

use crate::domain::{PeerId, Sequence, Transfer, TransferStatus};
use crate::error::{Result, UpslotError};

/// All live uploads of the session, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct TransferSet {
    /// Live records, ascending by sequence
    transfers: Vec<Transfer>,
    /// Next tick of the sequence clock
    next_sequence: Sequence,
    /// Tick at which each peer was last moved into a slot
    served: HashMap<PeerId, Sequence>,
}

impl TransferSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from previously saved records.
    ///
    /// Fails if the records are not strictly ascending or reach past `next_sequence`.
    pub fn from_parts(transfers: Vec<Transfer>, next_sequence: Sequence) -> Result<Self> {
        let set = Self {
            transfers,
            next_sequence,
            served: HashMap::new(),
        };
        set.verify()?;
        Ok(set)
    }

    fn tick(&mut self) -> Sequence {
        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();
        sequence
    }

    /// Queue a new upload. Duplicate peer/path pairs are separate entries.
    pub fn append(&mut self, peer: impl Into<PeerId>, path: impl Into<String>) -> Sequence {
        self.append_with_status(peer, path, TransferStatus::Queued)
    }

    /// Add a record in an arbitrary starting status.
    ///
    /// An in-flight starting status counts as the peer being served.
    pub fn append_with_status(
        &mut self,
        peer: impl Into<PeerId>,
        path: impl Into<String>,
        status: TransferStatus,
    ) -> Sequence {
        let sequence = self.tick();
        let mut transfer = Transfer::new(peer, path, sequence);
        transfer.status = status;

        tracing::debug!(%sequence, peer = %transfer.peer, %status, "Appended upload");

        if status.is_occupying() {
            let stamp = self.tick();
            self.served.insert(transfer.peer.clone(), stamp);
        }
        self.transfers.push(transfer);
        sequence
    }

    fn index_of(&self, sequence: Sequence) -> Result<usize> {
        self.transfers
            .binary_search_by_key(&sequence, |t| t.sequence)
            .map_err(|_| UpslotError::TransferNotFound(sequence))
    }

    pub fn get(&self, sequence: Sequence) -> Option<&Transfer> {
        self.index_of(sequence).ok().map(|idx| &self.transfers[idx])
    }

    /// Change a record's status in place.
    ///
    /// Entering a slot from outside one stamps the peer as served.
    pub fn update_status(&mut self, sequence: Sequence, status: TransferStatus) -> Result<()> {
        let idx = self.index_of(sequence)?;
        let previous = self.transfers[idx].status;
        self.transfers[idx].status = status;

        if status.is_occupying() && !previous.is_occupying() {
            let stamp = self.tick();
            self.served.insert(self.transfers[idx].peer.clone(), stamp);
        }

        tracing::debug!(%sequence, from = %previous, to = %status, "Updated upload status");
        Ok(())
    }

    /// Take a record out of the set.
    ///
    /// Meant for terminal records; removing a live one is allowed but logged.
    pub fn remove(&mut self, sequence: Sequence) -> Result<Transfer> {
        let idx = self.index_of(sequence)?;
        let transfer = self.transfers.remove(idx);

        if !transfer.status.is_terminal() {
            log::warn!(
                "Removing upload {} to {} while still {}",
                sequence,
                transfer.peer,
                transfer.status
            );
        }

        if !self.transfers.iter().any(|t| t.peer == transfer.peer) {
            self.served.remove(&transfer.peer);
        }
        Ok(transfer)
    }

    /// Live records in ascending sequence order. Call again to restart.
    pub fn iter_ordered(&self) -> std::slice::Iter<'_, Transfer> {
        self.transfers.iter()
    }

    /// Queued records of one peer, oldest first
    pub fn queued_for<'a>(&'a self, peer: &'a PeerId) -> impl Iterator<Item = &'a Transfer> + 'a {
        self.transfers
            .iter()
            .filter(move |t| &t.peer == peer && t.status.is_queued())
    }

    /// Tick at which `peer` last had a transfer moved into a slot
    pub fn service_stamp(&self, peer: &PeerId) -> Option<Sequence> {
        self.served.get(peer).copied()
    }

    /// All recorded service stamps
    pub fn service_stamps(&self) -> impl Iterator<Item = (&PeerId, Sequence)> + '_ {
        self.served.iter().map(|(peer, stamp)| (peer, *stamp))
    }

    /// Put back a service stamp read from storage.
    ///
    /// Stamps for peers without live records are dropped.
    pub fn restore_service_stamp(&mut self, peer: PeerId, stamp: Sequence) -> Result<()> {
        if stamp >= self.next_sequence {
            return Err(UpslotError::CorruptQueue(format!(
                "service stamp {} for {} is not below next sequence {}",
                stamp, peer, self.next_sequence
            )));
        }
        if self.transfers.iter().any(|t| t.peer == peer) {
            self.served.insert(peer, stamp);
        }
        Ok(())
    }

    /// Number of records currently holding a slot
    pub fn occupying_count(&self) -> usize {
        self.transfers.iter().filter(|t| t.status.is_occupying()).count()
    }

    pub fn next_sequence(&self) -> Sequence {
        self.next_sequence
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Check the ordering invariants.
    pub fn verify(&self) -> Result<()> {
        let mut previous: Option<Sequence> = None;
        for transfer in &self.transfers {
            if let Some(prev) = previous
                && transfer.sequence <= prev
            {
                return Err(UpslotError::CorruptQueue(format!(
                    "sequence {} follows {}",
                    transfer.sequence, prev
                )));
            }
            if transfer.sequence >= self.next_sequence {
                return Err(UpslotError::CorruptQueue(format!(
                    "sequence {} is not below next sequence {}",
                    transfer.sequence, self.next_sequence
                )));
            }
            previous = Some(transfer.sequence);
        }
        Ok(())
    }
}
