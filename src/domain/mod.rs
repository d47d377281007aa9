//! Domain types for upslot
//!
//! - Transfer: one queued or in-flight upload to one peer
//! - TransferStatus: the real-world statuses, collapsed to a SlotState for scheduling
//! - PeerId / Sequence: identity and arrival order

pub mod transfer;

pub use transfer::{PeerId, Sequence, SlotState, Transfer, TransferStatus};
