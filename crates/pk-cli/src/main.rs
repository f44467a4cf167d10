use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use pk_core::{Clock, ParkingLot, SystemClock};
use pk_db::Database;
use tracing_subscriber::EnvFilter;

use pk_cli::commands::{available, enter, exit, fines, init, payments, policy, stats, vehicles};
use pk_cli::{Cli, Commands, Config};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Open the database and rebuild the lot's in-memory state from it.
fn open_lot(
    config_path: Option<&Path>,
    warn_if_empty: bool,
) -> Result<(ParkingLot<Database>, Config)> {
    let (db, config) = open_database(config_path)?;
    let lot = ParkingLot::load(db, SystemClock, config.fine_policy)
        .context("failed to load parking lot")?;
    if warn_if_empty && lot.occupancy_stats().total == 0 {
        tracing::warn!("the lot has no spots yet; run 'pk init' first");
    }
    Ok((lot, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so tests that already installed a subscriber don't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config_path = cli.config.as_deref();
    let mut out = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Init { floors }) => {
            let (lot, config) = open_lot(config_path, false)?;
            init::run(&mut out, &lot, floors.unwrap_or(config.floors), &config.lot_name)?;
        }
        Some(Commands::Enter(args)) => {
            let (lot, _config) = open_lot(config_path, true)?;
            enter::run(&mut out, &lot, args)?;
        }
        Some(Commands::Exit(args)) => {
            let (lot, _config) = open_lot(config_path, true)?;
            exit::run(&mut out, &lot, args)?;
        }
        Some(Commands::Preview { plate, output }) => {
            let (lot, _config) = open_lot(config_path, true)?;
            exit::run_preview(&mut out, &lot, plate, output.json)?;
        }
        Some(Commands::Available { category, output }) => {
            let (lot, _config) = open_lot(config_path, true)?;
            available::run(&mut out, &lot, *category, output.json)?;
        }
        Some(Commands::Stats(output)) => {
            let (lot, config) = open_lot(config_path, false)?;
            stats::run(&mut out, &lot, &config.lot_name, output.json)?;
        }
        Some(Commands::Vehicles(output)) => {
            let (lot, _config) = open_lot(config_path, true)?;
            vehicles::run(&mut out, &lot, output.json)?;
        }
        Some(Commands::Overstays(output)) => {
            let (lot, _config) = open_lot(config_path, true)?;
            vehicles::run_overstays(&mut out, &lot, output.json)?;
        }
        Some(Commands::Policy(action)) => {
            let (lot, _config) = open_lot(config_path, false)?;
            policy::run(&mut out, &lot, action)?;
        }
        Some(Commands::Payments(args)) => {
            let (db, _config) = open_database(config_path)?;
            payments::run(&mut out, &db, args)?;
        }
        Some(Commands::Fines(action)) => {
            let (mut db, _config) = open_database(config_path)?;
            fines::run(&mut out, &mut db, action, SystemClock.now())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
