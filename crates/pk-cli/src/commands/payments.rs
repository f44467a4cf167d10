//! Payments command: the payment log and revenue per method.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use pk_core::{LicensePlate, Money, Payment, PaymentMethod};
use pk_db::{Database, MethodRevenue};
use serde::Serialize;

use crate::OutputArgs;

use super::util::{format_time, write_json};

#[derive(Debug, Args)]
pub struct PaymentsArgs {
    /// Only payments for this plate.
    #[arg(long)]
    pub plate: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Serialize)]
struct JsonRevenue {
    method: PaymentMethod,
    payments: i64,
    total: Money,
}

#[derive(Debug, Serialize)]
struct JsonPayments {
    payments: Vec<Payment>,
    revenue: Vec<JsonRevenue>,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &PaymentsArgs) -> Result<()> {
    let plate = args.plate.as_deref().map(LicensePlate::new).transpose()?;
    let payments = db.list_payments(plate.as_ref())?;
    let revenue = if plate.is_some() {
        Vec::new()
    } else {
        db.revenue_by_method()?
    };

    if args.output.json {
        return write_json(
            writer,
            &JsonPayments {
                payments,
                revenue: revenue
                    .into_iter()
                    .map(|r| JsonRevenue {
                        method: r.method,
                        payments: r.payments,
                        total: r.total,
                    })
                    .collect(),
            },
        );
    }

    if payments.is_empty() {
        writeln!(writer, "No payments recorded.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<26}  {:<10}  {:<6}  {:>10}  PAID AT",
        "PAYMENT", "PLATE", "METHOD", "TOTAL"
    )?;
    for payment in &payments {
        writeln!(
            writer,
            "{:<26}  {:<10}  {:<6}  {:>10}  {}",
            payment.id.as_str(),
            payment.plate.as_str(),
            payment.method.as_str(),
            payment.total.to_string(),
            format_time(payment.paid_at)
        )?;
    }

    write_revenue(writer, &revenue)?;
    Ok(())
}

fn write_revenue<W: Write>(writer: &mut W, revenue: &[MethodRevenue]) -> Result<()> {
    if revenue.is_empty() {
        return Ok(());
    }
    writeln!(writer)?;
    let mut total = Money::ZERO;
    for line in revenue {
        writeln!(
            writer,
            "{:<6} {:>3} payments  {}",
            line.method.display_name(),
            line.payments,
            line.total
        )?;
        total += line.total;
    }
    writeln!(writer, "Revenue: {total}")?;
    Ok(())
}
