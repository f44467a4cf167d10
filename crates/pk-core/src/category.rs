//! Vehicle and spot categories, and the compatibility matrix between them.
//!
//! | Vehicle    | Compact | Standard | Accessible | Reserved |
//! |------------|---------|----------|------------|----------|
//! | Motorcycle | yes     |          |            |          |
//! | Car        | yes     | yes      |            |          |
//! | SUV        |         | yes      |            |          |
//! | Accessible | yes     | yes      | yes        | yes      |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Money, ValidationError};

/// Class of vehicle requesting a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Motorcycle,
    Car,
    Suv,
    /// Vehicles registered for accessibility parking.
    Accessible,
}

impl VehicleCategory {
    pub const ALL: [Self; 4] = [Self::Motorcycle, Self::Car, Self::Suv, Self::Accessible];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Motorcycle => "motorcycle",
            Self::Car => "car",
            Self::Suv => "suv",
            Self::Accessible => "accessible",
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Motorcycle => "Motorcycle",
            Self::Car => "Car",
            Self::Suv => "SUV/Truck",
            Self::Accessible => "Accessible Vehicle",
        }
    }

    /// Whether this vehicle may occupy a spot of the given category.
    #[must_use]
    pub const fn can_park_in(self, spot: SpotCategory) -> bool {
        matches!(
            (self, spot),
            (Self::Motorcycle, SpotCategory::Compact)
                | (Self::Car, SpotCategory::Compact | SpotCategory::Standard)
                | (Self::Suv, SpotCategory::Standard)
                | (Self::Accessible, _)
        )
    }

    /// Spot categories this vehicle may use, in table order.
    pub fn eligible_spots(self) -> impl Iterator<Item = SpotCategory> {
        SpotCategory::ALL
            .into_iter()
            .filter(move |spot| self.can_park_in(*spot))
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motorcycle" => Ok(Self::Motorcycle),
            "car" => Ok(Self::Car),
            "suv" | "truck" => Ok(Self::Suv),
            "accessible" | "handicapped" => Ok(Self::Accessible),
            _ => Err(ValidationError::UnknownVehicleCategory {
                value: s.to_string(),
            }),
        }
    }
}

/// Class of parking spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotCategory {
    Compact,
    Standard,
    Accessible,
    Reserved,
}

impl SpotCategory {
    pub const ALL: [Self; 4] = [
        Self::Compact,
        Self::Standard,
        Self::Accessible,
        Self::Reserved,
    ];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Accessible => "accessible",
            Self::Reserved => "reserved",
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Compact => "Compact",
            Self::Standard => "Standard",
            Self::Accessible => "Accessible",
            Self::Reserved => "Reserved",
        }
    }

    /// Hourly rate a new spot of this category is created with.
    #[must_use]
    pub const fn default_rate(&self) -> Money {
        match self {
            Self::Compact | Self::Accessible => Money::from_cents(200),
            Self::Standard => Money::from_cents(500),
            Self::Reserved => Money::from_cents(1000),
        }
    }

    /// Row a spot of this category is placed on within its floor.
    #[must_use]
    pub const fn layout_row(&self) -> u32 {
        match self {
            Self::Compact => 1,
            Self::Standard => 2,
            Self::Accessible => 3,
            Self::Reserved => 4,
        }
    }
}

impl fmt::Display for SpotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SpotCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "standard" | "regular" => Ok(Self::Standard),
            "accessible" | "handicapped" => Ok(Self::Accessible),
            "reserved" => Ok(Self::Reserved),
            _ => Err(ValidationError::UnknownSpotCategory {
                value: s.to_string(),
            }),
        }
    }
}

/// Hourly rate actually charged for an occupation.
///
/// An accessible vehicle carrying a valid card that parks on an accessible
/// spot always pays the accessible default rate, whatever the spot is
/// configured with. Everyone else pays the spot's own rate.
#[must_use]
pub const fn effective_rate(
    spot_category: SpotCategory,
    spot_rate: Money,
    vehicle: VehicleCategory,
    has_accessibility_card: bool,
) -> Money {
    match (spot_category, vehicle, has_accessibility_card) {
        (SpotCategory::Accessible, VehicleCategory::Accessible, true) => {
            SpotCategory::Accessible.default_rate()
        }
        _ => spot_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_matrix_matches_table() {
        use SpotCategory::{Accessible, Compact, Reserved, Standard};

        let eligible = |v: VehicleCategory| v.eligible_spots().collect::<Vec<_>>();
        assert_eq!(eligible(VehicleCategory::Motorcycle), vec![Compact]);
        assert_eq!(eligible(VehicleCategory::Car), vec![Compact, Standard]);
        assert_eq!(eligible(VehicleCategory::Suv), vec![Standard]);
        assert_eq!(
            eligible(VehicleCategory::Accessible),
            vec![Compact, Standard, Accessible, Reserved]
        );
    }

    #[test]
    fn reserved_and_accessible_spots_only_take_accessible_vehicles() {
        for vehicle in VehicleCategory::ALL {
            let expected = vehicle == VehicleCategory::Accessible;
            assert_eq!(vehicle.can_park_in(SpotCategory::Reserved), expected);
            assert_eq!(vehicle.can_park_in(SpotCategory::Accessible), expected);
        }
    }

    #[test]
    fn categories_roundtrip_through_storage_strings() {
        for vehicle in VehicleCategory::ALL {
            assert_eq!(vehicle.as_str().parse::<VehicleCategory>().unwrap(), vehicle);
        }
        for spot in SpotCategory::ALL {
            assert_eq!(spot.as_str().parse::<SpotCategory>().unwrap(), spot);
        }
        assert_eq!(
            "Handicapped".parse::<VehicleCategory>().unwrap(),
            VehicleCategory::Accessible
        );
        assert!("bus".parse::<VehicleCategory>().is_err());
        assert!("valet".parse::<SpotCategory>().is_err());
    }

    #[test]
    fn categories_serialize_lowercase() {
        let json = serde_json::to_string(&VehicleCategory::Suv).unwrap();
        assert_eq!(json, "\"suv\"");
        let parsed: SpotCategory = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(parsed, SpotCategory::Reserved);
    }

    #[test]
    fn accessible_card_forces_accessible_rate_on_accessible_spot() {
        let configured = Money::from_cents(750);
        assert_eq!(
            effective_rate(
                SpotCategory::Accessible,
                configured,
                VehicleCategory::Accessible,
                true
            ),
            Money::from_cents(200)
        );
        // No card: the spot's configured rate applies.
        assert_eq!(
            effective_rate(
                SpotCategory::Accessible,
                configured,
                VehicleCategory::Accessible,
                false
            ),
            configured
        );
        // Card on a non-accessible spot: no override.
        assert_eq!(
            effective_rate(
                SpotCategory::Reserved,
                configured,
                VehicleCategory::Accessible,
                true
            ),
            configured
        );
    }
}
