//! Stats command: occupancy for the whole lot and per floor.

use std::io::Write;

use anyhow::Result;
use pk_core::{Clock, FinePolicy, FloorStats, OccupancyStats, ParkingLot, Store};
use serde::Serialize;

use super::util::write_json;

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonStats<'a> {
    pub lot_name: &'a str,
    pub fine_policy: FinePolicy,
    #[serde(flatten)]
    pub totals: OccupancyStats,
    pub floors: Vec<FloorStats>,
}

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    lot_name: &str,
    json: bool,
) -> Result<()> {
    let totals = lot.occupancy_stats();
    let floors = lot.floor_stats();
    let fine_policy = lot.fine_policy();

    if json {
        return write_json(
            writer,
            &JsonStats {
                lot_name,
                fine_policy,
                totals,
                floors,
            },
        );
    }

    writeln!(writer, "{lot_name}")?;
    writeln!(writer, "Spots:        {}", totals.total)?;
    writeln!(writer, "Occupied:     {}", totals.occupied)?;
    writeln!(writer, "Available:    {}", totals.available)?;
    writeln!(writer, "Occupancy:    {:.1}%", totals.occupancy_rate)?;
    writeln!(writer, "Fine policy:  {}", fine_policy.name())?;

    if floors.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "No floors yet. Run 'pk init' to lay out the lot.")?;
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "FLOOR  SPOTS  OCCUPIED  AVAILABLE")?;
    for floor in &floors {
        writeln!(
            writer,
            "{:<5}  {:>5}  {:>8}  {:>9}",
            floor.floor, floor.stats.total, floor.stats.occupied, floor.stats.available
        )?;
    }
    Ok(())
}
