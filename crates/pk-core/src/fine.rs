//! Overstay fine policies.
//!
//! A policy maps the billed duration of a session to a penalty. Durations up
//! to [`GRACE_HOURS`] are never fined. Exactly one policy is active per lot;
//! it is held by [`crate::ParkingLot`] and swapped under the same lock as the
//! registry, so a swap only affects bills computed afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Money, ValidationError};

/// Hours a vehicle may stay before any fine applies.
pub const GRACE_HOURS: i64 = 24;

const FIXED_FINE: Money = Money::from_units(50);
const HOURLY_FINE: Money = Money::from_units(20);

/// Progressive tiers: (overstay hours that must be exceeded, amount added).
const PROGRESSIVE_TIERS: [(i64, Money); 4] = [
    (0, Money::from_units(50)),
    (24, Money::from_units(100)),
    (48, Money::from_units(150)),
    (72, Money::from_units(200)),
];

/// Selectable overstay fine policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinePolicy {
    /// Flat RM 50 once the grace period is exceeded.
    #[default]
    Fixed,
    /// RM 20 for every hour beyond the grace period.
    Hourly,
    /// Tiered: RM 50, then +100 past 24 h overstay, +150 past 48 h, +200 past 72 h.
    Progressive,
}

impl FinePolicy {
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Hourly, Self::Progressive];

    /// Fine owed for a session billed at `duration_hours`.
    #[must_use]
    pub fn calculate(self, duration_hours: i64) -> Money {
        let overstay = overstay_hours(duration_hours);
        if overstay == 0 {
            return Money::ZERO;
        }
        match self {
            Self::Fixed => FIXED_FINE,
            Self::Hourly => HOURLY_FINE
                .checked_mul(overstay)
                .unwrap_or(Money::from_cents(i64::MAX)),
            Self::Progressive => PROGRESSIVE_TIERS
                .iter()
                .filter(|(threshold, _)| overstay > *threshold)
                .map(|(_, amount)| *amount)
                .sum(),
        }
    }

    /// Human-readable policy name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed Fine (RM 50 flat)",
            Self::Hourly => "Hourly Scheme (RM 20/hr)",
            Self::Progressive => "Progressive Scheme (Tiered)",
        }
    }

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Hourly => "hourly",
            Self::Progressive => "progressive",
        }
    }
}

/// Hours beyond the grace period, zero when within it.
#[must_use]
pub const fn overstay_hours(duration_hours: i64) -> i64 {
    if duration_hours > GRACE_HOURS {
        duration_hours - GRACE_HOURS
    } else {
        0
    }
}

impl fmt::Display for FinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FinePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "hourly" => Ok(Self::Hourly),
            "progressive" | "tiered" => Ok(Self::Progressive),
            _ => Err(ValidationError::UnknownFinePolicy {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    #[test]
    fn no_policy_fines_within_grace_period() {
        for policy in FinePolicy::ALL {
            for hours in [0, 1, 23, 24] {
                assert_eq!(policy.calculate(hours), Money::ZERO, "{policy} at {hours}h");
            }
        }
    }

    #[test]
    fn fixed_policy_is_flat() {
        assert_eq!(FinePolicy::Fixed.calculate(25), units(50));
        assert_eq!(FinePolicy::Fixed.calculate(200), units(50));
    }

    #[test]
    fn hourly_policy_charges_per_overstay_hour() {
        assert_eq!(FinePolicy::Hourly.calculate(25), units(20));
        assert_eq!(FinePolicy::Hourly.calculate(30), units(120));
    }

    #[test]
    fn progressive_policy_accumulates_tiers() {
        let p = FinePolicy::Progressive;
        assert_eq!(p.calculate(25), units(50));
        assert_eq!(p.calculate(48), units(50));
        assert_eq!(p.calculate(49), units(150));
        assert_eq!(p.calculate(73), units(300));
        assert_eq!(p.calculate(74), units(300));
        assert_eq!(p.calculate(97), units(500));
        assert_eq!(p.calculate(1000), units(500));
    }

    #[test]
    fn policy_parses_from_admin_input() {
        assert_eq!("Hourly".parse::<FinePolicy>().unwrap(), FinePolicy::Hourly);
        assert_eq!(
            "tiered".parse::<FinePolicy>().unwrap(),
            FinePolicy::Progressive
        );
        assert!("lenient".parse::<FinePolicy>().is_err());
    }

    #[test]
    fn default_policy_is_fixed() {
        assert_eq!(FinePolicy::default(), FinePolicy::Fixed);
        assert_eq!(FinePolicy::default().name(), "Fixed Fine (RM 50 flat)");
    }
}
