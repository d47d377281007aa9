//! Upload slot scheduling.
//!
//! This module provides:
//! - **Selection**: which queued upload starts next, honouring one slot per peer
//! - **Priority tiers**: privileged peers are drained before standard ones
//! - **Fairness**: strict arrival order or round robin across peers
//! - **Queue positions**: estimates for peers asking where they stand
//! - **TransferManager**: owns the queue and applies the selection
//!
//! # Architecture
//!
//! The scheduler is stateless:
//! 1. A slot frees or an upload is queued
//! 2. The manager asks `select_candidate` over the current transfer set
//! 3. The manager moves the returned upload into a slot
//! 4. When the upload ends the manager removes it and asks again
//!
//! # Example
//!
//! ```ignore
//! use upslot::scheduler::{FairnessMode, TransferManager, TransferManagerConfig};
//!
//! let mut manager = TransferManager::new(
//!     TransferManagerConfig::default().with_fairness(FairnessMode::RoundRobin),
//! );
//! manager.queue_upload("user1", "music/song.flac");
//! let started = manager.fill_slots();
//! ```

mod fairness;
mod manager;
mod position;
mod priority;
mod select;

pub use fairness::FairnessMode;
pub use manager::{BoxedPrivilegeSource, SharedTransferManager, TransferManager, TransferManagerConfig};
pub use position::queue_position;
pub use priority::{NoPrivileges, PrivilegeSource, PrivilegedPeers, Tier};
pub use select::{busy_peers, peer_rank, select_candidate};
