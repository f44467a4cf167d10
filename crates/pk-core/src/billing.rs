//! Duration, fee and fine computation.
//!
//! Every function here is pure. The lot feeds in the stored entry time, the
//! clock's "now", the effective rate and the active [`FinePolicy`]; nothing is
//! cached between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ParkingError;
use crate::fine::FinePolicy;
use crate::types::{Money, ValidationError};

/// Billed hours between entry and exit.
///
/// Elapsed time is counted in whole minutes and rounded up to the next hour
/// when any minutes remain (61 minutes bill as 2 hours, exactly 180 as 3).
/// Every session bills at least one hour.
pub fn duration_hours(entry: DateTime<Utc>, exit: DateTime<Utc>) -> Result<i64, ParkingError> {
    if exit < entry {
        return Err(ParkingError::InvalidInterval { entry, exit });
    }
    let minutes = (exit - entry).num_minutes();
    let mut hours = minutes / 60;
    if minutes % 60 > 0 {
        hours += 1;
    }
    Ok(hours.max(1))
}

/// Fee for `hours` at an hourly `rate`.
pub fn parking_fee(hours: i64, rate: Money) -> Result<Money, ParkingError> {
    if hours < 0 {
        return Err(ValidationError::Negative {
            field: "duration",
            value: hours,
        }
        .into());
    }
    if rate.is_negative() {
        return Err(ValidationError::Negative {
            field: "hourly rate",
            value: rate.cents(),
        }
        .into());
    }
    rate.checked_mul(hours).ok_or_else(|| {
        ValidationError::InvalidAmount {
            value: format!("{hours} x {rate}"),
            reason: "amount too large",
        }
        .into()
    })
}

/// Parking fee plus fines.
#[must_use]
pub fn total_bill(fee: Money, fine: Money) -> Money {
    fee + fine
}

/// Fine accrued by the current session alone.
#[must_use]
pub fn current_session_fine(policy: FinePolicy, hours: i64) -> Money {
    policy.calculate(hours)
}

/// A fully composed bill for one session at one instant.
///
/// Bills are advisory until the exit commits: closing a session always
/// recomputes against the stored entry time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub duration_hours: i64,
    /// Effective hourly rate the fee was computed with.
    pub hourly_rate: Money,
    pub parking_fee: Money,
    /// Fine from the active policy for this session.
    pub session_fine: Money,
    /// Unpaid fines carried over from the ledger.
    pub previous_fines: Money,
    /// `session_fine + previous_fines`.
    pub fine: Money,
    pub total: Money,
}

/// Composes the bill for a live session.
pub fn compose_bill(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    hourly_rate: Money,
    policy: FinePolicy,
    previous_fines: Money,
) -> Result<Bill, ParkingError> {
    if previous_fines.is_negative() {
        return Err(ValidationError::Negative {
            field: "unpaid fines",
            value: previous_fines.cents(),
        }
        .into());
    }
    let hours = duration_hours(entry, exit)?;
    let fee = parking_fee(hours, hourly_rate)?;
    let session_fine = current_session_fine(policy, hours);
    let fine = session_fine + previous_fines;
    Ok(Bill {
        entry_time: entry,
        exit_time: exit,
        duration_hours: hours,
        hourly_rate,
        parking_fee: fee,
        session_fine,
        previous_fines,
        fine,
        total: total_bill(fee, fine),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 30, hour, minute, 0).unwrap()
    }

    #[test]
    fn duration_rounds_up_to_whole_hours() {
        assert_eq!(duration_hours(at(10, 0), at(13, 0)).unwrap(), 3);
        assert_eq!(duration_hours(at(10, 0), at(11, 1)).unwrap(), 2);
        assert_eq!(duration_hours(at(10, 0), at(12, 30)).unwrap(), 3);
        assert_eq!(duration_hours(at(10, 0), at(10, 30)).unwrap(), 1);
        assert_eq!(duration_hours(at(10, 0), at(15, 59)).unwrap(), 6);
    }

    #[test]
    fn duration_bills_at_least_one_hour() {
        assert_eq!(duration_hours(at(10, 0), at(10, 0)).unwrap(), 1);
        let entry = at(10, 0);
        assert_eq!(
            duration_hours(entry, entry + Duration::seconds(59)).unwrap(),
            1
        );
    }

    #[test]
    fn duration_rejects_exit_before_entry() {
        let err = duration_hours(at(12, 0), at(11, 0)).unwrap_err();
        assert!(matches!(err, ParkingError::InvalidInterval { .. }));
    }

    #[test]
    fn fee_multiplies_hours_by_rate() {
        assert_eq!(
            parking_fee(3, Money::from_cents(500)).unwrap(),
            Money::from_cents(1500)
        );
        assert_eq!(
            parking_fee(2, Money::from_cents(200)).unwrap(),
            Money::from_cents(400)
        );
    }

    #[test]
    fn fee_rejects_negative_operands() {
        assert!(matches!(
            parking_fee(-1, Money::from_cents(500)),
            Err(ParkingError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(matches!(
            parking_fee(1, Money::from_cents(-500)),
            Err(ParkingError::Validation(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn total_adds_fee_and_fine() {
        assert_eq!(
            total_bill(Money::from_cents(1500), Money::ZERO),
            Money::from_cents(1500)
        );
        assert_eq!(
            total_bill(Money::from_cents(1500), Money::from_units(50)),
            Money::from_cents(6500)
        );
    }

    #[test]
    fn compose_bill_includes_previous_fines() {
        let entry = at(0, 0);
        let exit = entry + Duration::hours(30);
        let bill = compose_bill(
            entry,
            exit,
            Money::from_cents(500),
            FinePolicy::Hourly,
            Money::from_units(10),
        )
        .unwrap();

        assert_eq!(bill.duration_hours, 30);
        assert_eq!(bill.parking_fee, Money::from_units(150));
        assert_eq!(bill.session_fine, Money::from_units(120));
        assert_eq!(bill.fine, Money::from_units(130));
        assert_eq!(bill.total, Money::from_units(280));
    }

    #[test]
    fn compose_bill_rejects_negative_ledger_amount() {
        let result = compose_bill(
            at(9, 0),
            at(10, 0),
            Money::from_cents(500),
            FinePolicy::Fixed,
            Money::from_cents(-1),
        );
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn billed_hours_cover_elapsed_minutes(minutes in 1i64..200_000) {
            let entry = at(0, 0);
            let hours = duration_hours(entry, entry + Duration::minutes(minutes)).unwrap();
            prop_assert!(hours * 60 >= minutes);
            prop_assert!((hours - 1) * 60 < minutes);
        }
    }
}
