//! upslot - upload slot scheduling for peer-to-peer transfer queues
//!
//! Decides, each time an upload slot frees up, which queued upload starts
//! next: one slot per peer, privileged peers first, and either strict arrival
//! order or round robin between peers.

pub mod config;
pub mod domain;
pub mod error;
pub mod scheduler;
pub mod simulate;
pub mod store;

pub use error::{Result, UpslotError};
