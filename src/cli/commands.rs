//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - simulate: replay a queue through the scheduler
//! - queue: add, list, start and finish uploads in the persisted queue

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use upslot::scheduler::FairnessMode;

/// upslot - upload slot scheduler for peer-to-peer transfer queues
#[derive(Parser, Debug)]
#[command(name = "upslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a queue, one slot freed per step, and print who gets each slot
    Simulate {
        /// Peers with a queued upload, one entry per upload (comma separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        queue: Vec<String>,

        /// Peers that already have an upload in flight
        #[arg(short, long, value_delimiter = ',')]
        busy: Vec<String>,

        /// Privileged peers
        #[arg(short, long, value_delimiter = ',')]
        privileged: Vec<String>,

        /// Fairness mode (defaults to the configured one)
        #[arg(short, long, value_enum)]
        mode: Option<FairnessMode>,

        /// Free the slot before asking for the next upload instead of after
        #[arg(long)]
        clear_first: bool,
    },

    /// Manage the persisted upload queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

/// Upload queue subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum QueueCommands {
    /// Queue an upload
    Add {
        /// Peer requesting the file
        peer: String,

        /// File being requested
        path: String,
    },

    /// Show all live uploads
    List,

    /// Start uploads while slots are free
    Next,

    /// End an upload and drop it from the queue
    Finish {
        /// Sequence number of the upload
        sequence: u64,

        /// Record the upload as failed instead of finished
        #[arg(short, long)]
        failed: bool,
    },

    /// Show the estimated queue position of an upload
    Position {
        /// Sequence number of the upload
        sequence: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["upslot"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["upslot", "-v", "queue", "list"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["upslot", "queue", "list", "-c", "/path/to/upslot.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/upslot.yml")));
    }

    #[test]
    fn test_simulate_command() {
        let cli = Cli::try_parse_from([
            "upslot",
            "simulate",
            "-q",
            "user1,user1,user2",
            "-b",
            "user1",
            "-p",
            "puser1",
            "-m",
            "fifo",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                queue,
                busy,
                privileged,
                mode,
                clear_first,
            } => {
                assert_eq!(queue, vec!["user1", "user1", "user2"]);
                assert_eq!(busy, vec!["user1"]);
                assert_eq!(privileged, vec!["puser1"]);
                assert_eq!(mode, Some(FairnessMode::StrictArrival));
                assert!(!clear_first);
            }
            _ => panic!("Expected simulate command"),
        }
    }

    #[test]
    fn test_simulate_requires_queue() {
        assert!(Cli::try_parse_from(["upslot", "simulate"]).is_err());
    }

    #[test]
    fn test_simulate_round_robin_clear_first() {
        let cli = Cli::try_parse_from(["upslot", "simulate", "-q", "a", "-m", "round-robin", "--clear-first"]).unwrap();
        match cli.command {
            Commands::Simulate { mode, clear_first, .. } => {
                assert_eq!(mode, Some(FairnessMode::RoundRobin));
                assert!(clear_first);
            }
            _ => panic!("Expected simulate command"),
        }
    }

    #[test]
    fn test_queue_add() {
        let cli = Cli::try_parse_from(["upslot", "queue", "add", "user1", "music/song.flac"]).unwrap();
        match cli.command {
            Commands::Queue {
                command: QueueCommands::Add { peer, path },
            } => {
                assert_eq!(peer, "user1");
                assert_eq!(path, "music/song.flac");
            }
            _ => panic!("Expected queue add command"),
        }
    }

    #[test]
    fn test_queue_finish_failed() {
        let cli = Cli::try_parse_from(["upslot", "queue", "finish", "12", "--failed"]).unwrap();
        match cli.command {
            Commands::Queue {
                command: QueueCommands::Finish { sequence, failed },
            } => {
                assert_eq!(sequence, 12);
                assert!(failed);
            }
            _ => panic!("Expected queue finish command"),
        }
    }

    #[test]
    fn test_queue_position() {
        let cli = Cli::try_parse_from(["upslot", "queue", "position", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Queue {
                command: QueueCommands::Position { sequence: 3 }
            }
        ));
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }
}
