//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::enter::EnterArgs;
use crate::commands::exit::ExitArgs;
use crate::commands::fines::FinesAction;
use crate::commands::payments::PaymentsArgs;
use crate::commands::policy::PolicyAction;

/// Parking lot allocation and billing.
///
/// Assigns spots to arriving vehicles, bills them on exit and keeps the
/// payment log and fines ledger.
#[derive(Debug, Parser)]
#[command(name = "pk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lay out the lot's floors if it has no spots yet.
    Init {
        /// Number of floors (defaults to the configured value).
        #[arg(long)]
        floors: Option<u32>,
    },

    /// Park a vehicle and print its ticket.
    Enter(EnterArgs),

    /// Bill a vehicle, record the payment and free its spot.
    Exit(ExitArgs),

    /// Show what a parked vehicle would owe if it left now.
    Preview {
        /// License plate.
        plate: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List free spots a vehicle category may use.
    Available {
        /// Vehicle category: motorcycle, car, suv or accessible.
        #[arg(long, default_value = "car")]
        category: pk_core::VehicleCategory,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show occupancy for the lot and each floor.
    Stats(OutputArgs),

    /// List parked vehicles.
    Vehicles(OutputArgs),

    /// List parked vehicles that are past the free period.
    Overstays(OutputArgs),

    /// Show or change the overstay fine policy.
    #[command(subcommand)]
    Policy(PolicyAction),

    /// List recorded payments.
    Payments(PaymentsArgs),

    /// Manage the unpaid-fines ledger.
    #[command(subcommand)]
    Fines(FinesAction),
}

/// Output format flags shared by listing commands.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
