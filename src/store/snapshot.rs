//! JSON snapshot of the upload queue.
//!
//! Terminal records are never restored. What happens to uploads that were in
//! flight depends on the `RestoreMode`: after a client restart their
//! connections are gone and they go back in the queue, while a queue that is
//! only edited offline keeps them as they were.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PeerId, Sequence, Transfer, TransferStatus};
use crate::error::{Result, UpslotError};
use crate::store::TransferSet;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// What to do with in-flight uploads when reading a snapshot back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Put them back in the queue and forget who was served
    Requeue,
    /// Keep statuses and service stamps exactly as saved
    Preserve,
}

/// On-disk form of a transfer set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub next_sequence: Sequence,
    pub transfers: Vec<Transfer>,
    #[serde(default)]
    pub served: BTreeMap<PeerId, Sequence>,
}

impl QueueSnapshot {
    /// Capture the live records of a set
    pub fn capture(set: &TransferSet) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            next_sequence: set.next_sequence(),
            transfers: set.iter_ordered().cloned().collect(),
            served: set
                .service_stamps()
                .map(|(peer, stamp)| (peer.clone(), stamp))
                .collect(),
        }
    }

    /// Turn the snapshot back into a set.
    pub fn restore(self, mode: RestoreMode) -> Result<TransferSet> {
        if self.version != SNAPSHOT_VERSION {
            return Err(UpslotError::CorruptQueue(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let transfers = self
            .transfers
            .into_iter()
            .filter(|t| !t.status.is_terminal())
            .map(|mut t| {
                if mode == RestoreMode::Requeue && t.status.is_occupying() {
                    log::info!("Requeueing interrupted upload {} to {}", t.sequence, t.peer);
                    t.status = TransferStatus::Queued;
                }
                t
            })
            .collect();

        let mut set = TransferSet::from_parts(transfers, self.next_sequence)?;
        if mode == RestoreMode::Preserve {
            for (peer, stamp) in self.served {
                set.restore_service_stamp(peer, stamp)?;
            }
        }
        Ok(set)
    }
}

/// Write the set to `path`, replacing any previous snapshot.
pub fn save(path: impl AsRef<Path>, set: &TransferSet) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&QueueSnapshot::capture(set))?;

    // Write next to the target first so a crash never leaves half a file behind
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    log::debug!("Saved {} uploads to {}", set.len(), path.display());
    Ok(())
}

/// Read a set back from `path`. A missing file is an empty queue.
pub fn load(path: impl AsRef<Path>, mode: RestoreMode) -> Result<TransferSet> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("No queue file at {}, starting empty", path.display());
        return Ok(TransferSet::new());
    }

    let content = fs::read_to_string(path)?;
    let snapshot: QueueSnapshot = serde_json::from_str(&content)?;
    let set = snapshot.restore(mode)?;

    log::info!("Loaded {} uploads from {}", set.len(), path.display());
    Ok(set)
}
