//! Exit and preview commands: billing a parked vehicle.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use pk_core::{
    Bill, BillPreview, Clock, LicensePlate, ParkingLot, Receipt, SpotCategory, SpotId, Store,
};
use serde::Serialize;

use crate::OutputArgs;

use super::util::{format_time, write_json};

#[derive(Debug, Args)]
pub struct ExitArgs {
    /// License plate.
    pub plate: String,

    /// Payment method: cash or card.
    #[arg(long, default_value = "cash")]
    pub method: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Runs the exit command.
pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    args: &ExitArgs,
) -> Result<()> {
    let receipt = lot.close_session(&args.plate, &args.method)?;
    if args.output.json {
        return write_json(writer, &receipt);
    }
    write_receipt(writer, &receipt)
}

fn write_receipt<W: Write>(writer: &mut W, receipt: &Receipt) -> Result<()> {
    let payment = &receipt.payment;
    writeln!(writer, "Receipt:   {}", receipt.receipt_id)?;
    writeln!(writer, "Ticket:    {}", payment.session_id)?;
    writeln!(writer, "Plate:     {}", payment.plate)?;
    writeln!(
        writer,
        "Spot:      {} ({})",
        receipt.spot,
        receipt.spot_category.display_name()
    )?;
    writeln!(writer, "Entered:   {}", format_time(receipt.entry_time))?;
    writeln!(writer, "Exited:    {}", format_time(receipt.exit_time))?;
    writeln!(
        writer,
        "Duration:  {} h at {}/hr",
        receipt.duration_hours, receipt.hourly_rate
    )?;
    writeln!(writer, "Parking:   {}", payment.parking_fee)?;
    writeln!(writer, "Fines:     {}", payment.fine)?;
    writeln!(writer, "Total:     {}", payment.total)?;
    writeln!(writer, "Paid by:   {}", payment.method.display_name())?;
    Ok(())
}

/// JSON shape of a bill preview.
#[derive(Debug, Serialize)]
pub struct PreviewView {
    pub plate: LicensePlate,
    pub spot: SpotId,
    pub spot_category: SpotCategory,
    #[serde(flatten)]
    pub bill: Bill,
}

/// Runs the preview command. Nothing is recorded.
pub fn run_preview<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    lot: &ParkingLot<S, C>,
    plate: &str,
    json: bool,
) -> Result<()> {
    let BillPreview {
        session,
        spot_category,
        bill,
    } = lot.preview_bill(plate)?;

    if json {
        return write_json(
            writer,
            &PreviewView {
                plate: session.plate,
                spot: session.spot,
                spot_category,
                bill,
            },
        );
    }

    writeln!(writer, "Bill for {} (not paid)", session.plate)?;
    writeln!(
        writer,
        "Spot:           {} ({})",
        session.spot,
        spot_category.display_name()
    )?;
    writeln!(writer, "Entered:        {}", format_time(bill.entry_time))?;
    writeln!(writer, "As of:          {}", format_time(bill.exit_time))?;
    writeln!(
        writer,
        "Duration:       {} h at {}/hr",
        bill.duration_hours, bill.hourly_rate
    )?;
    writeln!(writer, "Parking:        {}", bill.parking_fee)?;
    writeln!(writer, "Overstay fine:  {}", bill.session_fine)?;
    writeln!(writer, "Unpaid fines:   {}", bill.previous_fines)?;
    writeln!(writer, "Total:          {}", bill.total)?;
    Ok(())
}
