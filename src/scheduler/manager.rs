//! Transfer manager: owns the upload queue and hands out slots.
//!
//! The manager holds everything a scheduling decision reads (the transfer set,
//! the privilege source, the fairness mode) and performs the step the
//! scheduler leaves to its caller: moving the chosen upload into a slot.
//!
//! Callers on several threads go through `SharedTransferManager`, which keeps
//! "select, then transition" under one lock so a peer can never be handed two
//! slots by racing callers.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::TransfersConfig;
use crate::domain::{PeerId, Sequence, Transfer, TransferStatus};
use crate::error::{Result, UpslotError};
use crate::scheduler::fairness::FairnessMode;
use crate::scheduler::position::queue_position;
use crate::scheduler::priority::{NoPrivileges, PrivilegeSource, PrivilegedPeers};
use crate::scheduler::select::select_candidate;
use crate::store::TransferSet;

/// Privilege source the manager can share across threads
pub type BoxedPrivilegeSource = Box<dyn PrivilegeSource + Send + Sync>;

/// Configuration for the TransferManager.
#[derive(Debug, Clone, Default)]
pub struct TransferManagerConfig {
    /// Fairness discipline within a tier.
    pub fairness: FairnessMode,
    /// Maximum uploads in flight at once (0 = unlimited).
    pub upload_slots: usize,
}

impl TransferManagerConfig {
    /// Set the fairness mode.
    pub fn with_fairness(mut self, fairness: FairnessMode) -> Self {
        self.fairness = fairness;
        self
    }

    /// Set the global slot limit.
    pub fn with_upload_slots(mut self, slots: usize) -> Self {
        self.upload_slots = slots;
        self
    }
}

impl From<&TransfersConfig> for TransferManagerConfig {
    fn from(config: &TransfersConfig) -> Self {
        Self {
            fairness: config.fairness,
            upload_slots: config.upload_slots,
        }
    }
}

/// Owns the upload queue and decides which upload starts next.
pub struct TransferManager {
    config: TransferManagerConfig,
    transfers: TransferSet,
    privileges: BoxedPrivilegeSource,
}

impl std::fmt::Debug for TransferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferManager")
            .field("config", &self.config)
            .field("transfers", &self.transfers.len())
            .finish_non_exhaustive()
    }
}

impl TransferManager {
    /// Create a manager with an empty queue and no privileged peers.
    pub fn new(config: TransferManagerConfig) -> Self {
        Self::with_transfers(config, TransferSet::new())
    }

    /// Create a manager over an existing queue.
    pub fn with_transfers(config: TransferManagerConfig, transfers: TransferSet) -> Self {
        Self {
            config,
            transfers,
            privileges: Box::new(NoPrivileges),
        }
    }

    /// Build a manager from the `transfers` config section.
    pub fn from_config(config: &TransfersConfig, transfers: TransferSet) -> Self {
        let privileged: PrivilegedPeers = config.privileged.iter().map(String::as_str).collect();
        Self::with_transfers(config.into(), transfers).with_privileges(privileged)
    }

    /// Replace the privilege source.
    pub fn with_privileges(mut self, privileges: impl PrivilegeSource + Send + Sync + 'static) -> Self {
        self.privileges = Box::new(privileges);
        self
    }

    pub fn mode(&self) -> FairnessMode {
        self.config.fairness
    }

    /// Switch fairness mode; takes effect on the next selection.
    pub fn set_mode(&mut self, mode: FairnessMode) {
        if mode != self.config.fairness {
            log::info!("Upload fairness changed: {} -> {}", self.config.fairness, mode);
        }
        self.config.fairness = mode;
    }

    pub fn upload_slots(&self) -> usize {
        self.config.upload_slots
    }

    pub fn set_upload_slots(&mut self, slots: usize) {
        self.config.upload_slots = slots;
    }

    /// Read access to the queue.
    pub fn transfers(&self) -> &TransferSet {
        &self.transfers
    }

    /// Number of uploads currently holding a slot.
    pub fn active_count(&self) -> usize {
        self.transfers.occupying_count()
    }

    /// Whether the global slot limit leaves room for another upload.
    pub fn has_free_slot(&self) -> bool {
        self.config.upload_slots == 0 || self.active_count() < self.config.upload_slots
    }

    /// Accept a new upload request.
    pub fn queue_upload(&mut self, peer: impl Into<PeerId>, path: impl Into<String>) -> Sequence {
        let peer = peer.into();
        let path = path.into();
        log::info!("Queued upload of {} to {}", path, peer);
        self.transfers.append(peer, path)
    }

    /// The upload that would start next. Pure; safe to poll.
    pub fn next_candidate(&self) -> Option<&Transfer> {
        select_candidate(&self.transfers, self.privileges.as_ref(), self.config.fairness)
    }

    /// Start the next upload if a slot is free.
    ///
    /// The chosen upload moves to `GettingStatus`. Returns its sequence, or
    /// `None` when nothing should start right now.
    pub fn start_next(&mut self) -> Option<Sequence> {
        if !self.has_free_slot() {
            tracing::debug!(
                active = self.active_count(),
                slots = self.config.upload_slots,
                "All upload slots in use"
            );
            return None;
        }

        let (sequence, peer) = {
            let candidate = self.next_candidate()?;
            (candidate.sequence, candidate.peer.clone())
        };

        // Candidate came from the set we own, so it is always found
        if let Err(e) = self.transfers.update_status(sequence, TransferStatus::GettingStatus) {
            log::error!("Failed to start upload {}: {}", sequence, e);
            return None;
        }

        log::info!("Starting upload {} to {}", sequence, peer);
        Some(sequence)
    }

    /// Start uploads until slots run out or nothing is eligible.
    pub fn fill_slots(&mut self) -> Vec<Sequence> {
        let mut started = Vec::new();
        while let Some(sequence) = self.start_next() {
            started.push(sequence);
        }
        started
    }

    /// Move an upload between queued and in-flight states.
    ///
    /// Terminal statuses go through `finish`, which also removes the record.
    pub fn set_status(&mut self, sequence: Sequence, status: TransferStatus) -> Result<()> {
        if status.is_terminal() {
            let from = self.status_of(sequence)?;
            return Err(UpslotError::InvalidTransition {
                sequence,
                from,
                to: status,
            });
        }
        self.transfers.update_status(sequence, status)
    }

    /// Mark an upload done (or failed) and drop it from the queue.
    pub fn finish(&mut self, sequence: Sequence, status: TransferStatus) -> Result<Transfer> {
        let from = self.status_of(sequence)?;
        if !status.is_terminal() {
            return Err(UpslotError::InvalidTransition {
                sequence,
                from,
                to: status,
            });
        }

        self.transfers.update_status(sequence, status)?;
        let transfer = self.transfers.remove(sequence)?;
        log::info!("Upload {} to {} ended: {}", sequence, transfer.peer, status);
        Ok(transfer)
    }

    /// Estimated place in the queue of a queued upload.
    pub fn queue_position(&self, sequence: Sequence) -> Option<usize> {
        queue_position(
            &self.transfers,
            self.privileges.as_ref(),
            self.config.fairness,
            sequence,
        )
    }

    fn status_of(&self, sequence: Sequence) -> Result<TransferStatus> {
        self.transfers
            .get(sequence)
            .map(|t| t.status)
            .ok_or(UpslotError::TransferNotFound(sequence))
    }
}

/// Thread-safe handle to a TransferManager.
///
/// Every method holds the lock for its whole body, so selection and the
/// following status change are one step as far as other threads can tell.
#[derive(Debug, Clone)]
pub struct SharedTransferManager {
    inner: Arc<Mutex<TransferManager>>,
}

impl SharedTransferManager {
    pub fn new(manager: TransferManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TransferManager>> {
        self.inner.lock().map_err(|e| UpslotError::Lock(e.to_string()))
    }

    /// Run `f` with exclusive access to the manager.
    pub fn with<R>(&self, f: impl FnOnce(&mut TransferManager) -> R) -> Result<R> {
        let mut manager = self.lock()?;
        Ok(f(&mut manager))
    }

    pub fn queue_upload(&self, peer: impl Into<PeerId>, path: impl Into<String>) -> Result<Sequence> {
        Ok(self.lock()?.queue_upload(peer, path))
    }

    pub fn start_next(&self) -> Result<Option<Sequence>> {
        Ok(self.lock()?.start_next())
    }

    pub fn fill_slots(&self) -> Result<Vec<Sequence>> {
        Ok(self.lock()?.fill_slots())
    }

    pub fn set_status(&self, sequence: Sequence, status: TransferStatus) -> Result<()> {
        self.lock()?.set_status(sequence, status)
    }

    pub fn finish(&self, sequence: Sequence, status: TransferStatus) -> Result<Transfer> {
        self.lock()?.finish(sequence, status)
    }
}
