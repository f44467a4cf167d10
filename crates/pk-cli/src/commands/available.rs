//! Available command: free spots for a vehicle category.

use std::io::Write;

use anyhow::Result;
use pk_core::{Clock, ParkingLot, Store, VehicleCategory};

use super::util::write_json;

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    category: VehicleCategory,
    json: bool,
) -> Result<()> {
    let spots = lot.list_available(category);
    if json {
        return write_json(writer, &spots);
    }

    let eligible: Vec<&str> = category
        .eligible_spots()
        .map(|spot| spot.display_name())
        .collect();
    let eligible = eligible.join(", ");

    if spots.is_empty() {
        writeln!(
            writer,
            "No free spots for {} ({eligible}).",
            category.display_name()
        )?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} free spots for {} ({eligible})",
        spots.len(),
        category.display_name()
    )?;
    writeln!(writer)?;
    writeln!(writer, "{:<12}  {:<10}  RATE", "SPOT", "CATEGORY")?;
    for spot in &spots {
        writeln!(
            writer,
            "{:<12}  {:<10}  {}/hr",
            spot.id.to_string(),
            spot.category.display_name(),
            spot.hourly_rate
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use pk_core::{EntryRequest, SpotCategory};

    use crate::commands::test_support::{lot, output};

    #[test]
    fn lists_compatible_free_spots_in_order() {
        let (lot, _clock) = lot(1);
        lot.open_session(&EntryRequest::new("MOTO01", VehicleCategory::Motorcycle))
            .unwrap();

        let mut buffer = Vec::new();
        run(&mut buffer, &lot, VehicleCategory::Motorcycle, false).unwrap();

        assert_snapshot!(output(buffer), @r"
        4 free spots for Motorcycle (Compact)

        SPOT          CATEGORY    RATE
        F1-R1-S2      Compact     RM 2.00/hr
        F1-R1-S3      Compact     RM 2.00/hr
        F1-R1-S4      Compact     RM 2.00/hr
        F1-R1-S5      Compact     RM 2.00/hr
        ");
    }

    #[test]
    fn reports_when_nothing_is_free() {
        let (lot, _clock) = lot(0);
        lot.add_floor(&[(SpotCategory::Standard, 1)]).unwrap();
        lot.open_session(&EntryRequest::new("SUV001", VehicleCategory::Suv))
            .unwrap();

        let mut buffer = Vec::new();
        run(&mut buffer, &lot, VehicleCategory::Suv, false).unwrap();
        assert_eq!(output(buffer), "No free spots for SUV/Truck (Standard).\n");
    }

    #[test]
    fn json_lists_spots() {
        let (lot, _clock) = lot(1);
        let mut buffer = Vec::new();
        run(&mut buffer, &lot, VehicleCategory::Accessible, true).unwrap();

        let spots: Vec<serde_json::Value> = serde_json::from_str(&output(buffer)).unwrap();
        assert_eq!(spots.len(), 18);
        assert_eq!(spots[0]["id"], "F1-R1-S1");
        assert_eq!(spots[17]["category"], "reserved");
        assert!(spots[0]["occupant"].is_null());
    }
}
