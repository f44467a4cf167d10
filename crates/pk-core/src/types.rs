//! Core type definitions with validation.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest accepted plate after separators are stripped.
pub const PLATE_MIN_LEN: usize = 3;

/// Longest accepted plate after separators are stripped.
pub const PLATE_MAX_LEN: usize = 10;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The plate did not normalize to 3-10 alphanumeric characters.
    #[error("invalid license plate {value:?}: expected 3-10 letters or digits")]
    InvalidPlate { value: String },

    /// A spot key did not match `F{floor}-R{row}-S{index}`.
    #[error("invalid spot key {value:?}: expected F<floor>-R<row>-S<index>")]
    InvalidSpotKey { value: String },

    /// A monetary amount or duration was negative.
    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    /// A monetary amount could not be parsed.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: &'static str },

    /// Unknown vehicle category name.
    #[error("unknown vehicle category: {value}")]
    UnknownVehicleCategory { value: String },

    /// Unknown spot category name.
    #[error("unknown spot category: {value}")]
    UnknownSpotCategory { value: String },

    /// Unknown fine policy name.
    #[error("unknown fine policy: {value} (expected fixed, hourly or progressive)")]
    UnknownFinePolicy { value: String },

    /// A structural change referenced a floor that was never added.
    #[error("floor {floor} does not exist")]
    UnknownFloor { floor: u32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A parking session (ticket) identifier.
    ///
    /// Derived deterministically from the plate and entry time, see
    /// [`SessionId::derive`].
    SessionId, "session ID"
);

define_string_id!(
    /// A payment identifier.
    ///
    /// Derived deterministically from the plate and payment time, see
    /// [`PaymentId::derive`].
    PaymentId, "payment ID"
);

/// Compact timestamp used inside derived identifiers (`yyyyMMddHHmmss`).
fn id_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

impl SessionId {
    /// Builds `T-{PLATE}-{yyyyMMddHHmmss}`.
    pub fn derive(plate: &LicensePlate, entry_time: DateTime<Utc>) -> Self {
        Self(format!("T-{plate}-{}", id_timestamp(entry_time)))
    }
}

impl PaymentId {
    /// Builds `P-{PLATE}-{yyyyMMddHHmmss}`.
    pub fn derive(plate: &LicensePlate, paid_at: DateTime<Utc>) -> Self {
        Self(format!("P-{plate}-{}", id_timestamp(paid_at)))
    }

    /// The receipt shown for this payment shares its suffix: `R-...`.
    pub fn receipt_id(&self) -> String {
        self.0
            .strip_prefix("P-")
            .map_or_else(|| format!("R-{}", self.0), |rest| format!("R-{rest}"))
    }
}

/// A normalized license plate.
///
/// Separators and anything else that is not an ASCII letter or digit are
/// stripped and the remainder is upper-cased, so `"abc-123"` and `"ABC 123"`
/// name the same vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicensePlate(String);

impl LicensePlate {
    /// Normalizes and validates a raw plate.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "license plate",
            });
        }
        let normalized: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if !(PLATE_MIN_LEN..=PLATE_MAX_LEN).contains(&normalized.len()) {
            return Err(ValidationError::InvalidPlate {
                value: raw.to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized plate.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LicensePlate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LicensePlate> for String {
    fn from(plate: LicensePlate) -> Self {
        plate.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LicensePlate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stable key of a parking spot: `F{floor}-R{row}-S{index}`.
///
/// Ordering is numeric by (floor, row, index), which is the order every
/// availability listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpotId {
    floor: u32,
    row: u32,
    index: u32,
}

impl SpotId {
    /// Creates a key from its 1-based coordinates.
    #[must_use]
    pub const fn new(floor: u32, row: u32, index: u32) -> Self {
        Self { floor, row, index }
    }

    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}-R{}-S{}", self.floor, self.row, self.index)
    }
}

impl FromStr for SpotId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidSpotKey {
            value: s.to_string(),
        };
        let normalized = s.trim().to_ascii_uppercase();
        let mut parts = normalized.split('-');
        let mut component = |prefix: char| -> Result<u32, ValidationError> {
            let part = parts.next().ok_or_else(invalid)?;
            let digits = part.strip_prefix(prefix).ok_or_else(invalid)?;
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let value: u32 = digits.parse().map_err(|_| invalid())?;
            if value == 0 {
                return Err(invalid());
            }
            Ok(value)
        };
        let floor = component('F')?;
        let row = component('R')?;
        let index = component('S')?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { floor, row, index })
    }
}

impl TryFrom<String> for SpotId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpotId> for String {
    fn from(id: SpotId) -> Self {
        id.to_string()
    }
}

/// A monetary amount in integer cents.
///
/// All fees, rates, fines and totals use this type so that sums never drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Creates an amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a whole number of hours (returns `None` on overflow).
    #[must_use]
    pub const fn checked_mul(self, factor: i64) -> Option<Self> {
        match self.0.checked_mul(factor) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}RM {}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    /// Parses `"12"`, `"12.5"` or `"12.50"` into cents. Negative values and
    /// more than two decimals are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| ValidationError::InvalidAmount {
            value: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty amount"));
        }
        if trimmed.starts_with('-') {
            return Err(invalid("amount cannot be negative"));
        }

        let (units_str, frac_str) = match trimmed.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (trimmed, ""),
        };
        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }

        let units: i64 = units_str.parse().map_err(|_| invalid("amount too large"))?;
        let cents: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            2 => frac_str.parse().map_err(|_| invalid("not a number"))?,
            _ => return Err(invalid("too many decimals")),
        };

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Self)
            .ok_or_else(|| invalid("amount too large"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn plate_normalizes_separators_and_case() {
        let plate = LicensePlate::new(" abc-123 ").unwrap();
        assert_eq!(plate.as_str(), "ABC123");
        assert_eq!(plate, LicensePlate::new("ABC 123").unwrap());
    }

    #[test]
    fn plate_enforces_length_after_stripping() {
        assert!(LicensePlate::new("AB").is_err());
        assert!(LicensePlate::new("A-B").is_err());
        assert!(LicensePlate::new("ABC").is_ok());
        assert!(LicensePlate::new("ABCDE12345").is_ok());
        assert!(LicensePlate::new("ABCDE123456").is_err());
        assert_eq!(
            LicensePlate::new("   "),
            Err(ValidationError::Empty {
                field: "license plate"
            })
        );
    }

    #[test]
    fn plate_serde_rejects_invalid() {
        let result: Result<LicensePlate, _> = serde_json::from_str("\"x\"");
        assert!(result.is_err());
        let parsed: LicensePlate = serde_json::from_str("\"wxy-42\"").unwrap();
        assert_eq!(parsed.as_str(), "WXY42");
    }

    #[test]
    fn spot_id_parses_and_displays() {
        let id: SpotId = "F1-R2-S5".parse().unwrap();
        assert_eq!(id, SpotId::new(1, 2, 5));
        assert_eq!(id.to_string(), "F1-R2-S5");
        assert_eq!("f1-r2-s5".parse::<SpotId>().unwrap(), id);
    }

    #[test]
    fn spot_id_rejects_malformed_keys() {
        for key in ["", "F1-R2", "F1-R2-S", "F0-R1-S1", "X1-R2-S3", "F1-R2-S3-T4", "F1-R-2-S3"] {
            assert!(key.parse::<SpotId>().is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn spot_id_orders_numerically() {
        let mut ids = vec![
            SpotId::new(1, 2, 10),
            SpotId::new(2, 1, 1),
            SpotId::new(1, 2, 9),
            SpotId::new(1, 1, 3),
        ];
        ids.sort();
        let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["F1-R1-S3", "F1-R2-S9", "F1-R2-S10", "F2-R1-S1"]);
    }

    #[test]
    fn derived_ids_use_plate_and_timestamp() {
        let plate = LicensePlate::new("abc123").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 30, 14, 30, 22).unwrap();
        assert_eq!(
            SessionId::derive(&plate, at).as_str(),
            "T-ABC123-20250130143022"
        );
        let payment = PaymentId::derive(&plate, at);
        assert_eq!(payment.as_str(), "P-ABC123-20250130143022");
        assert_eq!(payment.receipt_id(), "R-ABC123-20250130143022");
    }

    #[test]
    fn session_id_rejects_empty() {
        assert!(SessionId::new("").is_err());
        assert!(SessionId::new("T-ABC-1").is_ok());
    }

    #[test]
    fn money_displays_with_currency() {
        assert_eq!(Money::ZERO.to_string(), "RM 0.00");
        assert_eq!(Money::from_cents(1505).to_string(), "RM 15.05");
        assert_eq!(Money::from_units(50).to_string(), "RM 50.00");
        assert_eq!(Money::from_cents(-250).to_string(), "-RM 2.50");
    }

    #[test]
    fn money_parses_decimal_input() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::from_cents(1000));
        assert_eq!("10.5".parse::<Money>().unwrap(), Money::from_cents(1050));
        assert_eq!(" 2.30 ".parse::<Money>().unwrap(), Money::from_cents(230));
        assert!("12.345".parse::<Money>().is_err());
        assert!("-1".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn money_sums() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(350));
    }
}
