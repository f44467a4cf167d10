//! Hierarchical spot inventory (lot → floor → row → spot) and occupancy.
//!
//! The registry is the only owner of [`Spot`] records. Spots are kept in a
//! `BTreeMap` keyed by [`SpotId`], so every listing comes out ordered by
//! (floor, row, index) and callers that take the first match are reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::{SpotCategory, VehicleCategory};
use crate::error::ParkingError;
use crate::records::Vehicle;
use crate::types::{LicensePlate, Money, SpotId, ValidationError};

/// Spots per category created on each floor by [`Registry::with_default_layout`].
pub const DEFAULT_FLOOR_LAYOUT: [(SpotCategory, u32); 4] = [
    (SpotCategory::Compact, 5),
    (SpotCategory::Standard, 8),
    (SpotCategory::Accessible, 2),
    (SpotCategory::Reserved, 3),
];

/// Occupancy state of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Free,
    Occupied,
}

/// A single billable parking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub category: SpotCategory,
    /// Configured hourly rate; see [`crate::effective_rate`] for overrides.
    pub hourly_rate: Money,
    /// Plate of the occupying vehicle. `Some` exactly when occupied.
    pub occupant: Option<LicensePlate>,
}

impl Spot {
    /// A free spot at the category's default rate.
    #[must_use]
    pub const fn new(id: SpotId, category: SpotCategory) -> Self {
        Self {
            id,
            category,
            hourly_rate: category.default_rate(),
            occupant: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SpotStatus {
        if self.occupant.is_some() {
            SpotStatus::Occupied
        } else {
            SpotStatus::Free
        }
    }

    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// Whether a vehicle of `category` may use this spot.
    #[must_use]
    pub const fn accepts(&self, category: VehicleCategory) -> bool {
        category.can_park_in(self.category)
    }
}

/// Aggregate occupancy counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancyStats {
    pub total: usize,
    pub occupied: usize,
    pub available: usize,
    /// `occupied * 100 / total`, zero for an empty lot.
    pub occupancy_rate: f64,
}

impl OccupancyStats {
    #[expect(
        clippy::cast_precision_loss,
        reason = "spot counts are far below f64 precision limits"
    )]
    fn from_counts(total: usize, occupied: usize) -> Self {
        let occupancy_rate = if total == 0 {
            0.0
        } else {
            (occupied as f64 * 100.0) / total as f64
        };
        Self {
            total,
            occupied,
            available: total - occupied,
            occupancy_rate,
        }
    }
}

/// Occupancy of one floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorStats {
    pub floor: u32,
    #[serde(flatten)]
    pub stats: OccupancyStats,
}

/// The spot inventory.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    floors: u32,
    spots: BTreeMap<SpotId, Spot>,
}

impl Registry {
    /// An empty lot with no floors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A lot of `floors` floors, each laid out per [`DEFAULT_FLOOR_LAYOUT`].
    #[must_use]
    pub fn with_default_layout(floors: u32) -> Self {
        let mut registry = Self::new();
        for _ in 0..floors {
            let floor = registry.add_floor();
            for (category, count) in DEFAULT_FLOOR_LAYOUT {
                for _ in 0..count {
                    let id = registry.next_spot_id(floor, category);
                    registry.insert_spot(Spot::new(id, category));
                }
            }
        }
        registry
    }

    /// Rebuilds a registry from persisted spots.
    ///
    /// Floors are implied by the highest floor number present. Occupancy is
    /// taken as stored; [`crate::ParkingLot`] reconciles it against sessions.
    pub fn from_spots(spots: impl IntoIterator<Item = Spot>) -> Self {
        let mut registry = Self::new();
        for spot in spots {
            registry.floors = registry.floors.max(spot.id.floor());
            registry.insert_spot(spot);
        }
        registry
    }

    /// Appends a floor and returns its number.
    pub fn add_floor(&mut self) -> u32 {
        self.floors += 1;
        self.floors
    }

    /// Adds a spot at the category's default rate.
    pub fn add_spot(
        &mut self,
        floor: u32,
        category: SpotCategory,
    ) -> Result<SpotId, ValidationError> {
        self.add_spot_with_rate(floor, category, category.default_rate())
    }

    /// Adds a spot on the category's row with the next free index on `floor`.
    pub fn add_spot_with_rate(
        &mut self,
        floor: u32,
        category: SpotCategory,
        hourly_rate: Money,
    ) -> Result<SpotId, ValidationError> {
        if floor == 0 || floor > self.floors {
            return Err(ValidationError::UnknownFloor { floor });
        }
        if hourly_rate.is_negative() {
            return Err(ValidationError::Negative {
                field: "hourly rate",
                value: hourly_rate.cents(),
            });
        }
        let id = self.next_spot_id(floor, category);
        self.insert_spot(Spot {
            hourly_rate,
            ..Spot::new(id, category)
        });
        Ok(id)
    }

    fn next_spot_id(&self, floor: u32, category: SpotCategory) -> SpotId {
        let next_index = self
            .spots
            .keys()
            .filter(|id| id.floor() == floor)
            .map(SpotId::index)
            .max()
            .unwrap_or(0)
            + 1;
        SpotId::new(floor, category.layout_row(), next_index)
    }

    fn insert_spot(&mut self, spot: Spot) {
        self.spots.insert(spot.id, spot);
    }

    #[must_use]
    pub const fn floor_count(&self) -> u32 {
        self.floors
    }

    /// All spots in (floor, row, index) order.
    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.spots.values()
    }

    pub fn find_by_id(&self, id: &SpotId) -> Result<&Spot, ParkingError> {
        self.spots
            .get(id)
            .ok_or(ParkingError::SpotNotFound { spot: *id })
    }

    /// Free spots a vehicle of `category` may use, in (floor, row, index) order.
    pub fn find_available(&self, category: VehicleCategory) -> Vec<&Spot> {
        self.spots
            .values()
            .filter(|spot| spot.is_free() && spot.accepts(category))
            .collect()
    }

    /// Checks that `vehicle` could occupy `id` without changing anything.
    pub fn check_occupy(&self, id: &SpotId, vehicle: &Vehicle) -> Result<&Spot, ParkingError> {
        let spot = self.find_by_id(id)?;
        if let Some(occupant) = &spot.occupant {
            return Err(ParkingError::SpotOccupied {
                spot: *id,
                occupant: occupant.clone(),
            });
        }
        if !spot.accepts(vehicle.category) {
            return Err(ParkingError::IncompatibleCategory {
                spot: *id,
                vehicle: vehicle.category,
                spot_category: spot.category,
            });
        }
        Ok(spot)
    }

    /// Marks `id` occupied by `vehicle`.
    pub fn occupy(&mut self, id: &SpotId, vehicle: &Vehicle) -> Result<(), ParkingError> {
        self.check_occupy(id, vehicle)?;
        if let Some(spot) = self.spots.get_mut(id) {
            spot.occupant = Some(vehicle.plate.clone());
        }
        Ok(())
    }

    /// Frees `id`, returning the plate that was there.
    pub fn release(&mut self, id: &SpotId) -> Result<Option<LicensePlate>, ParkingError> {
        let spot = self
            .spots
            .get_mut(id)
            .ok_or(ParkingError::SpotNotFound { spot: *id })?;
        Ok(spot.occupant.take())
    }

    /// Frees every spot. Used before re-binding restored sessions.
    pub(crate) fn clear_occupancy(&mut self) {
        for spot in self.spots.values_mut() {
            spot.occupant = None;
        }
    }

    pub fn stats(&self) -> OccupancyStats {
        let occupied = self.spots.values().filter(|s| !s.is_free()).count();
        OccupancyStats::from_counts(self.spots.len(), occupied)
    }

    /// Per-floor occupancy, floors without spots included.
    pub fn floor_stats(&self) -> Vec<FloorStats> {
        (1..=self.floors)
            .map(|floor| {
                let on_floor = self.spots.values().filter(|s| s.id.floor() == floor);
                let (total, occupied) =
                    on_floor.fold((0, 0), |(total, occupied), spot| {
                        (total + 1, occupied + usize::from(!spot.is_free()))
                    });
                FloorStats {
                    floor,
                    stats: OccupancyStats::from_counts(total, occupied),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn vehicle(plate: &str, category: VehicleCategory) -> Vehicle {
        Vehicle {
            plate: LicensePlate::new(plate).unwrap(),
            category,
            has_accessibility_card: false,
            entry_time: Utc.with_ymd_and_hms(2025, 1, 30, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn default_layout_has_eighteen_spots_per_floor() {
        let registry = Registry::with_default_layout(2);
        assert_eq!(registry.floor_count(), 2);
        assert_eq!(registry.stats().total, 36);

        let first_floor: Vec<String> = registry
            .spots()
            .filter(|s| s.id.floor() == 1)
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(first_floor.first().map(String::as_str), Some("F1-R1-S1"));
        assert_eq!(first_floor[5], "F1-R2-S6");
        assert_eq!(first_floor[13], "F1-R3-S14");
        assert_eq!(first_floor.last().map(String::as_str), Some("F1-R4-S18"));
    }

    #[test]
    fn add_spot_requires_existing_floor() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.add_spot(1, SpotCategory::Compact),
            Err(ValidationError::UnknownFloor { floor: 1 })
        );
        let floor = registry.add_floor();
        let id = registry.add_spot(floor, SpotCategory::Reserved).unwrap();
        assert_eq!(id.to_string(), "F1-R4-S1");
        let next = registry.add_spot(floor, SpotCategory::Compact).unwrap();
        assert_eq!(next.to_string(), "F1-R1-S2");
    }

    #[test]
    fn add_spot_with_rate_overrides_default() {
        let mut registry = Registry::new();
        let floor = registry.add_floor();
        let id = registry
            .add_spot_with_rate(floor, SpotCategory::Standard, Money::from_cents(800))
            .unwrap();
        assert_eq!(
            registry.find_by_id(&id).unwrap().hourly_rate,
            Money::from_cents(800)
        );
        assert!(
            registry
                .add_spot_with_rate(floor, SpotCategory::Standard, Money::from_cents(-1))
                .is_err()
        );
    }

    #[test]
    fn find_available_is_ordered_and_filtered() {
        let mut registry = Registry::with_default_layout(2);
        let car = vehicle("CAR001", VehicleCategory::Car);
        registry.occupy(&SpotId::new(1, 1, 1), &car).unwrap();

        let available = registry.find_available(VehicleCategory::Car);
        assert_eq!(available.len(), 2 * 13 - 1);
        assert_eq!(available[0].id, SpotId::new(1, 1, 2));
        assert!(available.windows(2).all(|w| w[0].id < w[1].id));
        assert!(available.iter().all(|s| s.is_free()));
    }

    #[test]
    fn occupy_rejects_taken_and_incompatible_spots() {
        let mut registry = Registry::with_default_layout(1);
        let suv = vehicle("SUV001", VehicleCategory::Suv);
        let car = vehicle("CAR001", VehicleCategory::Car);

        let compact = SpotId::new(1, 1, 1);
        assert!(matches!(
            registry.occupy(&compact, &suv),
            Err(ParkingError::IncompatibleCategory { .. })
        ));

        registry.occupy(&compact, &car).unwrap();
        let err = registry
            .occupy(&compact, &vehicle("CAR002", VehicleCategory::Car))
            .unwrap_err();
        assert!(matches!(
            err,
            ParkingError::SpotOccupied { occupant, .. } if occupant.as_str() == "CAR001"
        ));

        assert!(matches!(
            registry.occupy(&SpotId::new(9, 1, 1), &car),
            Err(ParkingError::SpotNotFound { .. })
        ));
    }

    #[test]
    fn release_frees_spot() {
        let mut registry = Registry::with_default_layout(1);
        let id = SpotId::new(1, 2, 6);
        registry
            .occupy(&id, &vehicle("CAR001", VehicleCategory::Car))
            .unwrap();
        assert_eq!(registry.find_by_id(&id).unwrap().status(), SpotStatus::Occupied);

        let previous = registry.release(&id).unwrap();
        assert_eq!(previous.map(String::from).as_deref(), Some("CAR001"));
        assert_eq!(registry.find_by_id(&id).unwrap().status(), SpotStatus::Free);
        assert!(registry.release(&SpotId::new(3, 3, 3)).is_err());
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for simple ratios"
    )]
    fn stats_report_rate() {
        assert_eq!(Registry::new().stats().occupancy_rate, 0.0);

        let mut registry = Registry::new();
        let floor = registry.add_floor();
        let a = registry.add_spot(floor, SpotCategory::Compact).unwrap();
        registry.add_spot(floor, SpotCategory::Compact).unwrap();
        registry
            .occupy(&a, &vehicle("MOTO01", VehicleCategory::Motorcycle))
            .unwrap();

        let stats = registry.stats();
        assert_eq!((stats.total, stats.occupied, stats.available), (2, 1, 1));
        assert_eq!(stats.occupancy_rate, 50.0);

        let floors = registry.floor_stats();
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].stats.occupied, 1);
    }

    #[test]
    fn from_spots_restores_floors_and_order() {
        let spots = vec![
            Spot::new(SpotId::new(2, 1, 1), SpotCategory::Compact),
            Spot::new(SpotId::new(1, 2, 1), SpotCategory::Standard),
        ];
        let registry = Registry::from_spots(spots);
        assert_eq!(registry.floor_count(), 2);
        let ids: Vec<SpotId> = registry.spots().map(|s| s.id).collect();
        assert_eq!(ids, vec![SpotId::new(1, 2, 1), SpotId::new(2, 1, 1)]);
    }

    fn any_vehicle_category() -> impl Strategy<Value = VehicleCategory> {
        prop::sample::select(VehicleCategory::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn available_spots_are_always_compatible(
            category in any_vehicle_category(),
            occupied in prop::collection::vec(0usize..36, 0..20),
        ) {
            let mut registry = Registry::with_default_layout(2);
            let ids: Vec<SpotId> = registry.spots().map(|s| s.id).collect();
            let filler = vehicle("FILL01", VehicleCategory::Accessible);
            for index in occupied {
                let _ = registry.occupy(&ids[index], &filler);
            }
            for spot in registry.find_available(category) {
                prop_assert!(category.can_park_in(spot.category));
                prop_assert!(spot.is_free());
            }
        }
    }
}
