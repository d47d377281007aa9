//! CLI module for upslot - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for replaying queues and
//! managing the persisted upload queue.

pub mod commands;

pub use commands::Cli;
