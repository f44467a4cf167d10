//! Enter command: parks a vehicle and prints its ticket.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use pk_core::{
    Clock, EntryRequest, LicensePlate, Money, ParkingLot, SessionId, SpotCategory, SpotId, Store,
    VehicleCategory, effective_rate,
};
use serde::Serialize;

use crate::OutputArgs;

use super::util::{format_time, write_json};

#[derive(Debug, Args)]
pub struct EnterArgs {
    /// License plate; spaces and dashes are ignored.
    pub plate: String,

    /// Vehicle category: motorcycle, car, suv or accessible.
    #[arg(long, default_value = "car")]
    pub category: VehicleCategory,

    /// The driver holds a valid accessibility card.
    #[arg(long)]
    pub card: bool,

    /// Park in this spot (e.g. F1-R2-S6) instead of the first free one.
    #[arg(long)]
    pub spot: Option<SpotId>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// The ticket handed to the driver.
#[derive(Debug, Serialize)]
pub struct Ticket {
    pub ticket_id: SessionId,
    pub plate: LicensePlate,
    pub spot: SpotId,
    pub spot_category: SpotCategory,
    pub hourly_rate: Money,
    pub entry_time: DateTime<Utc>,
}

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    args: &EnterArgs,
) -> Result<()> {
    let request = EntryRequest::new(&args.plate, args.category)
        .with_accessibility_card(args.card)
        .with_preferred_spot(args.spot);
    let session = lot.open_session(&request)?;
    let spot = lot.find_spot(&session.spot)?;

    let ticket = Ticket {
        ticket_id: session.id,
        plate: session.plate,
        spot: spot.id,
        spot_category: spot.category,
        hourly_rate: effective_rate(spot.category, spot.hourly_rate, args.category, args.card),
        entry_time: session.entry_time,
    };

    if args.output.json {
        return write_json(writer, &ticket);
    }
    writeln!(writer, "Ticket:   {}", ticket.ticket_id)?;
    writeln!(writer, "Plate:    {}", ticket.plate)?;
    writeln!(
        writer,
        "Spot:     {} ({})",
        ticket.spot,
        ticket.spot_category.display_name()
    )?;
    writeln!(writer, "Rate:     {}/hr", ticket.hourly_rate)?;
    writeln!(writer, "Entered:  {}", format_time(ticket.entry_time))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use pk_core::ParkingError;

    use crate::commands::test_support::{lot, output};

    fn args(plate: &str, category: VehicleCategory) -> EnterArgs {
        EnterArgs {
            plate: plate.to_string(),
            category,
            card: false,
            spot: None,
            output: OutputArgs::default(),
        }
    }

    #[test]
    fn enter_prints_ticket() {
        let (lot, _clock) = lot(1);
        let mut buffer = Vec::new();
        run(&mut buffer, &lot, &args("abc 123", VehicleCategory::Car)).unwrap();

        assert_snapshot!(output(buffer), @r"
        Ticket:   T-ABC123-20250130100000
        Plate:    ABC123
        Spot:     F1-R1-S1 (Compact)
        Rate:     RM 2.00/hr
        Entered:  2025-01-30 10:00:00 UTC
        ");
    }

    #[test]
    fn enter_with_card_shows_accessible_rate_on_preferred_spot() {
        let (lot, _clock) = lot(1);
        let spot = lot
            .add_spot(1, SpotCategory::Accessible, Some(Money::from_units(8)))
            .unwrap();
        let request = EnterArgs {
            card: true,
            spot: Some(spot),
            output: OutputArgs { json: true },
            ..args("OKU001", VehicleCategory::Accessible)
        };
        let mut buffer = Vec::new();
        run(&mut buffer, &lot, &request).unwrap();

        let ticket: serde_json::Value = serde_json::from_str(&output(buffer)).unwrap();
        assert_eq!(ticket["spot"], "F1-R3-S19");
        assert_eq!(ticket["spot_category"], "accessible");
        assert_eq!(ticket["hourly_rate"], 200);
    }

    #[test]
    fn enter_surfaces_duplicate_vehicle() {
        let (lot, _clock) = lot(1);
        run(&mut Vec::new(), &lot, &args("ABC123", VehicleCategory::Car)).unwrap();
        let err = run(&mut Vec::new(), &lot, &args("ABC123", VehicleCategory::Car)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParkingError>(),
            Some(ParkingError::DuplicateVehicle { .. })
        ));
        assert_eq!(err.to_string(), "vehicle ABC123 is already parked");
    }
}
