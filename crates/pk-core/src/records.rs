//! Records persisted for active vehicles, sessions and payments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::Bill;
use crate::category::{SpotCategory, VehicleCategory};
use crate::error::ParkingError;
use crate::types::{LicensePlate, Money, PaymentId, SessionId, SpotId};

/// A vehicle currently in the lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub plate: LicensePlate,
    pub category: VehicleCategory,
    /// Only meaningful for [`VehicleCategory::Accessible`].
    pub has_accessibility_card: bool,
    pub entry_time: DateTime<Utc>,
}

/// An active parking session (the ticket handed out at entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub plate: LicensePlate,
    pub spot: SpotId,
    pub entry_time: DateTime<Utc>,
}

impl Session {
    /// Starts a session for `vehicle` on `spot` at the vehicle's entry time.
    pub fn start(vehicle: &Vehicle, spot: SpotId) -> Self {
        Self {
            id: SessionId::derive(&vehicle.plate, vehicle.entry_time),
            plate: vehicle.plate.clone(),
            spot,
            entry_time: vehicle.entry_time,
        }
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub const ALL: [Self; 2] = [Self::Cash, Self::Card];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            _ => Err(ParkingError::PaymentValidation {
                reason: format!("unsupported payment method {s:?} (expected cash or card)"),
            }),
        }
    }
}

/// An immutable payment record. Written once on exit, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub plate: LicensePlate,
    pub session_id: SessionId,
    pub parking_fee: Money,
    pub fine: Money,
    pub total: Money,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a payment for a settled bill, validating the amounts.
    pub fn for_bill(
        session: &Session,
        bill: &Bill,
        method: PaymentMethod,
    ) -> Result<Self, ParkingError> {
        if bill.parking_fee.is_negative() || bill.fine.is_negative() {
            return Err(ParkingError::PaymentValidation {
                reason: format!(
                    "negative amount (fee {}, fine {})",
                    bill.parking_fee, bill.fine
                ),
            });
        }
        Ok(Self {
            id: PaymentId::derive(&session.plate, bill.exit_time),
            plate: session.plate.clone(),
            session_id: session.id.clone(),
            parking_fee: bill.parking_fee,
            fine: bill.fine,
            total: bill.total,
            method,
            paid_at: bill.exit_time,
        })
    }
}

/// Everything needed to render a receipt after a successful exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub receipt_id: String,
    pub payment: Payment,
    pub spot: SpotId,
    pub spot_category: SpotCategory,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub duration_hours: i64,
    pub hourly_rate: Money,
}

impl Receipt {
    pub(crate) fn new(
        payment: Payment,
        spot: SpotId,
        spot_category: SpotCategory,
        bill: &Bill,
    ) -> Self {
        Self {
            receipt_id: payment.id.receipt_id(),
            payment,
            spot,
            spot_category,
            entry_time: bill.entry_time,
            exit_time: bill.exit_time,
            duration_hours: bill.duration_hours,
            hourly_rate: bill.hourly_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::billing::compose_bill;
    use crate::fine::FinePolicy;

    fn vehicle() -> Vehicle {
        Vehicle {
            plate: LicensePlate::new("ABC123").unwrap(),
            category: VehicleCategory::Car,
            has_accessibility_card: false,
            entry_time: Utc.with_ymd_and_hms(2025, 1, 30, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn session_id_derives_from_vehicle_entry() {
        let session = Session::start(&vehicle(), SpotId::new(1, 2, 6));
        assert_eq!(session.id.as_str(), "T-ABC123-20250130100000");
        assert_eq!(session.spot.to_string(), "F1-R2-S6");
    }

    #[test]
    fn payment_method_rejects_unknown_values() {
        assert_eq!("CARD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, ParkingError::PaymentValidation { .. }));
    }

    #[test]
    fn payment_and_receipt_follow_bill() {
        let vehicle = vehicle();
        let session = Session::start(&vehicle, SpotId::new(1, 2, 6));
        let exit = Utc.with_ymd_and_hms(2025, 1, 30, 12, 30, 0).unwrap();
        let bill = compose_bill(
            vehicle.entry_time,
            exit,
            Money::from_cents(500),
            FinePolicy::Fixed,
            Money::ZERO,
        )
        .unwrap();

        let payment = Payment::for_bill(&session, &bill, PaymentMethod::Cash).unwrap();
        assert_eq!(payment.id.as_str(), "P-ABC123-20250130123000");
        assert_eq!(payment.total, Money::from_cents(1500));
        assert_eq!(payment.session_id, session.id);

        let receipt = Receipt::new(payment, session.spot, SpotCategory::Standard, &bill);
        assert_eq!(receipt.receipt_id, "R-ABC123-20250130123000");
        assert_eq!(receipt.duration_hours, 3);
    }
}
