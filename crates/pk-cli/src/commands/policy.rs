//! Policy command: show or swap the overstay fine policy.

use std::io::Write;

use anyhow::Result;
use clap::Subcommand;
use pk_core::{Clock, FinePolicy, GRACE_HOURS, ParkingLot, Store};

#[derive(Debug, Subcommand)]
pub enum PolicyAction {
    /// Show the active policy and the alternatives.
    Show,
    /// Activate a policy: fixed, hourly or progressive.
    Set {
        policy: FinePolicy,
    },
}

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    action: &PolicyAction,
) -> Result<()> {
    match action {
        PolicyAction::Show => {
            let active = lot.fine_policy();
            writeln!(writer, "Fines apply after {GRACE_HOURS} h.")?;
            for policy in FinePolicy::ALL {
                let marker = if policy == active { "*" } else { " " };
                writeln!(writer, "{marker} {:<12} {}", policy.as_str(), policy.name())?;
            }
        }
        PolicyAction::Set { policy } => {
            let previous = lot.set_fine_policy(*policy)?;
            if previous == *policy {
                writeln!(writer, "Fine policy is already {}.", policy.name())?;
            } else {
                writeln!(
                    writer,
                    "Fine policy changed: {} -> {}",
                    previous.name(),
                    policy.name()
                )?;
            }
        }
    }
    Ok(())
}
