//! Storage layer for upslot.
//!
//! - **TransferSet**: the in-memory, arrival-ordered set of live uploads the
//!   scheduler reads from
//! - **snapshot**: JSON persistence of that set across restarts
//!
//! # Example
//!
//! ```ignore
//! use upslot::store::{RestoreMode, TransferSet, snapshot};
//!
//! let mut set = TransferSet::new();
//! let seq = set.append("user1", "music/song.flac");
//! snapshot::save("/tmp/uploads.json", &set)?;
//! let restored = snapshot::load("/tmp/uploads.json", RestoreMode::Requeue)?;
//! ```

pub mod snapshot;
mod transfer_set;

pub use snapshot::{QueueSnapshot, RestoreMode};
pub use transfer_set::TransferSet;
