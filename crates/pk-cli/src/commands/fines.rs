//! Fines command: the ledger of fines carried over to a vehicle's next exit.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use pk_core::{LicensePlate, Money};
use pk_db::{Database, FineRecord, FineStatus};
use serde::Serialize;

use crate::OutputArgs;

use super::util::{format_time, write_json};

#[derive(Debug, Subcommand)]
pub enum FinesAction {
    /// Record a fine, settled on the vehicle's next exit.
    Add {
        plate: String,
        /// Amount in ringgit, e.g. 50 or 12.50.
        amount: Money,
        #[arg(long, default_value = "manual")]
        reason: String,
    },
    /// List fines, unpaid only unless --all.
    List {
        #[arg(long)]
        plate: Option<String>,
        /// Include paid fines.
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Serialize)]
struct JsonFine<'a> {
    id: i64,
    plate: &'a LicensePlate,
    amount: Money,
    reason: &'a str,
    status: &'static str,
    issued_at: DateTime<Utc>,
    paid_by: Option<&'a str>,
}

impl<'a> From<&'a FineRecord> for JsonFine<'a> {
    fn from(fine: &'a FineRecord) -> Self {
        Self {
            id: fine.id,
            plate: &fine.plate,
            amount: fine.amount,
            reason: &fine.reason,
            status: fine.status.as_str(),
            issued_at: fine.issued_at,
            paid_by: fine.paid_by.as_ref().map(|id| id.as_str()),
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    action: &FinesAction,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        FinesAction::Add {
            plate,
            amount,
            reason,
        } => {
            let plate = LicensePlate::new(plate)?;
            let id = db.add_fine(&plate, *amount, reason, now)?;
            writeln!(writer, "Fine #{id} recorded: {plate} owes {amount} ({reason})")?;
        }
        FinesAction::List { plate, all, output } => {
            let plate = plate.as_deref().map(LicensePlate::new).transpose()?;
            let fines = db.list_fines(plate.as_ref(), !*all)?;
            if output.json {
                let view: Vec<JsonFine<'_>> = fines.iter().map(JsonFine::from).collect();
                return write_json(writer, &view);
            }
            write_table(writer, &fines)?;
        }
    }
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, fines: &[FineRecord]) -> Result<()> {
    if fines.is_empty() {
        writeln!(writer, "No fines.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:>4}  {:<10}  {:>10}  {:<6}  {:<23}  REASON",
        "ID", "PLATE", "AMOUNT", "STATUS", "ISSUED"
    )?;
    for fine in fines {
        writeln!(
            writer,
            "{:>4}  {:<10}  {:>10}  {:<6}  {:<23}  {}",
            fine.id,
            fine.plate.as_str(),
            fine.amount.to_string(),
            fine.status.as_str(),
            format_time(fine.issued_at),
            fine.reason
        )?;
    }
    let outstanding: Money = fines
        .iter()
        .filter(|f| f.status == FineStatus::Unpaid)
        .map(|f| f.amount)
        .sum();
    writeln!(writer)?;
    writeln!(writer, "Outstanding: {outstanding}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;

    use crate::commands::test_support::output;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 30, hour, 0, 0).unwrap()
    }

    fn add(db: &mut Database, plate: &str, amount: &str, reason: &str, hour: u32) -> String {
        let mut buffer = Vec::new();
        run(
            &mut buffer,
            db,
            &FinesAction::Add {
                plate: plate.to_string(),
                amount: amount.parse().unwrap(),
                reason: reason.to_string(),
            },
            at(hour),
        )
        .unwrap();
        output(buffer)
    }

    fn list(db: &mut Database, plate: Option<&str>, json: bool) -> String {
        let mut buffer = Vec::new();
        run(
            &mut buffer,
            db,
            &FinesAction::List {
                plate: plate.map(str::to_string),
                all: false,
                output: OutputArgs { json },
            },
            at(12),
        )
        .unwrap();
        output(buffer)
    }

    #[test]
    fn add_confirms_with_normalized_plate() {
        let mut db = Database::open_in_memory().unwrap();
        let out = add(&mut db, "abc-123", "50", "blocked exit", 9);
        assert_eq!(out, "Fine #1 recorded: ABC123 owes RM 50.00 (blocked exit)\n");
    }

    #[test]
    fn add_rejects_zero_amount() {
        let mut db = Database::open_in_memory().unwrap();
        let mut buffer = Vec::new();
        let result = run(
            &mut buffer,
            &mut db,
            &FinesAction::Add {
                plate: "ABC123".to_string(),
                amount: Money::ZERO,
                reason: "none".to_string(),
            },
            at(9),
        );
        assert!(result.is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn list_shows_unpaid_fines_with_total() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut db, "ABC123", "50", "blocked exit", 9);
        add(&mut db, "XYZ789", "12.5", "manual", 10);

        assert_snapshot!(list(&mut db, None, false), @r"
          ID  PLATE           AMOUNT  STATUS  ISSUED                   REASON
           1  ABC123        RM 50.00  unpaid  2025-01-30 09:00:00 UTC  blocked exit
           2  XYZ789        RM 12.50  unpaid  2025-01-30 10:00:00 UTC  manual

        Outstanding: RM 62.50
        ");
    }

    #[test]
    fn list_filters_by_plate_as_json() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut db, "ABC123", "50", "blocked exit", 9);
        add(&mut db, "XYZ789", "12.5", "manual", 10);

        let fines: Vec<serde_json::Value> =
            serde_json::from_str(&list(&mut db, Some("xyz 789"), true)).unwrap();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0]["plate"], "XYZ789");
        assert_eq!(fines[0]["amount"], 1250);
        assert_eq!(fines[0]["status"], "unpaid");
        assert!(fines[0]["paid_by"].is_null());
    }

    #[test]
    fn list_on_empty_ledger() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(list(&mut db, None, false), "No fines.\n");
    }
}
