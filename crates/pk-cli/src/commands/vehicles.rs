//! Vehicles and overstays commands: what is parked right now.

use std::io::Write;

use anyhow::Result;
use pk_core::fine::overstay_hours;
use pk_core::{Clock, GRACE_HOURS, LicensePlate, Money, ParkingLot, SpotId, Store};
use serde::Serialize;

use super::util::{format_time, write_json};

/// Runs the vehicles command.
pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    json: bool,
) -> Result<()> {
    let parked = lot.parked_vehicles();
    if json {
        return write_json(writer, &parked);
    }

    if parked.is_empty() {
        writeln!(writer, "No vehicles parked.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<10}  {:<18}  {:<12}  ENTERED",
        "PLATE", "CATEGORY", "SPOT"
    )?;
    for entry in &parked {
        writeln!(
            writer,
            "{:<10}  {:<18}  {:<12}  {}",
            entry.vehicle.plate.as_str(),
            entry.vehicle.category.display_name(),
            entry.session.spot.to_string(),
            format_time(entry.session.entry_time)
        )?;
    }
    Ok(())
}

/// A vehicle past the free period.
#[derive(Debug, Clone, Serialize)]
pub struct Overstay {
    pub plate: LicensePlate,
    pub spot: SpotId,
    pub duration_hours: i64,
    pub overstay_hours: i64,
    pub fine: Money,
}

/// Parked vehicles whose bill would carry an overstay fine now, longest first.
pub fn find_overstays<S: Store, C: Clock>(lot: &ParkingLot<S, C>) -> Result<Vec<Overstay>> {
    let mut overstays = Vec::new();
    for entry in lot.parked_vehicles() {
        let preview = lot.preview_bill(entry.vehicle.plate.as_str())?;
        let hours = preview.bill.duration_hours;
        if hours > GRACE_HOURS {
            overstays.push(Overstay {
                plate: entry.vehicle.plate,
                spot: preview.session.spot,
                duration_hours: hours,
                overstay_hours: overstay_hours(hours),
                fine: preview.bill.session_fine,
            });
        }
    }
    overstays.sort_by_key(|o| std::cmp::Reverse(o.duration_hours));
    Ok(overstays)
}

/// Runs the overstays command.
pub fn run_overstays<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    json: bool,
) -> Result<()> {
    let overstays = find_overstays(lot)?;
    if json {
        return write_json(writer, &overstays);
    }

    if overstays.is_empty() {
        writeln!(writer, "No vehicles over {GRACE_HOURS} h.")?;
        return Ok(());
    }

    writeln!(writer, "Fine policy: {}", lot.fine_policy().name())?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:<10}  {:<12}  {:>5}  {:>5}  FINE",
        "PLATE", "SPOT", "HOURS", "OVER"
    )?;
    for overstay in &overstays {
        writeln!(
            writer,
            "{:<10}  {:<12}  {:>5}  {:>5}  {}",
            overstay.plate.as_str(),
            overstay.spot.to_string(),
            overstay.duration_hours,
            overstay.overstay_hours,
            overstay.fine
        )?;
    }
    Ok(())
}
