use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use upslot::config::{Config, TransfersConfig};
use upslot::domain::{Sequence, TransferStatus};
use upslot::scheduler::TransferManager;
use upslot::simulate::{self, Scenario};
use upslot::store::{RestoreMode, snapshot};

mod cli;

use cli::Cli;
use cli::commands::{Commands, QueueCommands};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("upslot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("upslot.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Simulate {
            queue,
            busy,
            privileged,
            mode,
            clear_first,
        } => {
            let scenario = Scenario {
                queued: queue.clone(),
                in_progress: busy.clone(),
                privileged: privileged.clone(),
                mode: mode.unwrap_or(config.transfers.fairness),
                clear_first: *clear_first,
            };
            handle_simulate_command(&scenario)
        }
        Commands::Queue { command } => handle_queue_command(command, &config.transfers),
    }
}

fn handle_simulate_command(scenario: &Scenario) -> Result<()> {
    info!("Replaying queue: {:?}", scenario);
    println!(
        "{} {} uploads, {} in flight, {}",
        "Simulating:".green(),
        scenario.queued.len(),
        scenario.in_progress.len(),
        scenario.mode
    );

    let steps = simulate::replay(scenario).context("Replay failed")?;
    for (i, step) in steps.iter().enumerate() {
        match step {
            Some(peer) => println!("  {:>3}. {}", i + 1, peer.to_string().cyan()),
            None => println!("  {:>3}. {}", i + 1, "-".dimmed()),
        }
    }
    Ok(())
}

fn open_manager(config: &TransfersConfig) -> Result<(TransferManager, PathBuf)> {
    let path = config.queue_path();
    let set = snapshot::load(&path, RestoreMode::Preserve)
        .with_context(|| format!("Failed to load queue from {}", path.display()))?;
    Ok((TransferManager::from_config(config, set), path))
}

fn save_manager(manager: &TransferManager, path: &Path) -> Result<()> {
    snapshot::save(path, manager.transfers()).with_context(|| format!("Failed to save queue to {}", path.display()))
}

fn handle_queue_command(command: &QueueCommands, config: &TransfersConfig) -> Result<()> {
    info!("Handling queue command: {:?}", command);
    let (mut manager, path) = open_manager(config)?;

    match command {
        QueueCommands::Add { peer, path: file } => {
            let sequence = manager.queue_upload(peer.as_str(), file.as_str());
            save_manager(&manager, &path)?;
            println!("{} {} {} -> {}", "Queued:".green(), sequence, file, peer);
        }
        QueueCommands::List => {
            if manager.transfers().is_empty() {
                println!("{}", "Upload queue is empty".dimmed());
            }
            for transfer in manager.transfers().iter_ordered() {
                let status = if transfer.status.is_queued() {
                    let place = manager
                        .queue_position(transfer.sequence)
                        .map(|p| format!("Queued (place {})", p))
                        .unwrap_or_else(|| transfer.status.to_string());
                    place.normal()
                } else {
                    transfer.status.to_string().yellow()
                };
                println!("  {:>5}  {:<20} {:<24} {}", transfer.sequence, transfer.peer, status, transfer.path);
            }
        }
        QueueCommands::Next => {
            let started = manager.fill_slots();
            save_manager(&manager, &path)?;
            print_started(&manager, &started);
        }
        QueueCommands::Finish { sequence, failed } => {
            let status = if *failed {
                TransferStatus::Failed
            } else {
                TransferStatus::Finished
            };
            let transfer = manager
                .finish(Sequence(*sequence), status)
                .with_context(|| format!("Failed to finish upload #{}", sequence))?;
            println!("{} {} -> {} ({})", "Ended:".red(), transfer.sequence, transfer.peer, status);

            // Refill the slot that just freed up
            let started = manager.fill_slots();
            save_manager(&manager, &path)?;
            print_started(&manager, &started);
        }
        QueueCommands::Position { sequence } => match manager.queue_position(Sequence(*sequence)) {
            Some(place) => println!("{} #{} is at place {}", "Position:".green(), sequence, place),
            None => println!("{} #{} is not queued", "Position:".yellow(), sequence),
        },
    }
    Ok(())
}

fn print_started(manager: &TransferManager, started: &[Sequence]) {
    if started.is_empty() {
        println!("{}", "No upload can start right now".dimmed());
        return;
    }
    for sequence in started {
        if let Some(transfer) = manager.transfers().get(*sequence) {
            println!("{} {} {} -> {}", "Started:".green(), transfer.sequence, transfer.path, transfer.peer);
        }
    }
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}

