//! Init command: lay out the floors of a new lot.

use std::io::Write;

use anyhow::{Result, bail};
use pk_core::{Clock, DEFAULT_FLOOR_LAYOUT, ParkingLot, Store};

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    floors: u32,
    lot_name: &str,
) -> Result<()> {
    if floors == 0 {
        bail!("A lot needs at least one floor");
    }

    let existing = lot.occupancy_stats().total;
    if existing > 0 {
        writeln!(
            writer,
            "{lot_name} is already laid out ({existing} spots on {} floors).",
            lot.floor_stats().len()
        )?;
        return Ok(());
    }

    for _ in 0..floors {
        lot.add_floor(&DEFAULT_FLOOR_LAYOUT)?;
    }

    writeln!(writer, "Initialized {lot_name} with {floors} floors.")?;
    writeln!(writer, "Each floor:")?;
    for (category, count) in DEFAULT_FLOOR_LAYOUT {
        writeln!(
            writer,
            "  {count:>2} {:<10}  {}/hr",
            category.display_name(),
            category.default_rate()
        )?;
    }
    writeln!(writer, "Total spots: {}", lot.occupancy_stats().total)?;
    Ok(())
}
