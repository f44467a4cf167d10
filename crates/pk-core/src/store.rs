//! The persistence seam consumed by [`crate::ParkingLot`].
//!
//! A store holds four record families (spots, active vehicles, active
//! sessions, payments) plus the unpaid-fines ledger and the selected fine
//! policy. The two commit methods are the transactional boundaries: an
//! implementation must apply all of their writes or none of them.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::fine::FinePolicy;
use crate::records::{Payment, Session, Vehicle};
use crate::registry::Spot;
use crate::types::{LicensePlate, Money, PaymentId, SpotId};

/// Writes performed when a vehicle exits.
#[derive(Debug, Clone, Copy)]
pub struct ExitCommit<'a> {
    /// Appended to the payment log.
    pub payment: &'a Payment,
    /// Session (and its vehicle) to delete.
    pub session: &'a Session,
    /// Marks the plate's unpaid fines as paid; set when the bill included them.
    pub settle_fines: bool,
}

/// Keyed persistent storage for the lot.
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All spots, ordered by (floor, row, index).
    fn load_spots(&self) -> Result<Vec<Spot>, Self::Error>;

    /// Inserts or replaces spot layout rows.
    fn save_spots(&mut self, spots: &[Spot]) -> Result<(), Self::Error>;

    /// Overwrites the stored occupant of each spot, all or nothing. Layout
    /// fields are left as stored.
    fn save_occupancy(&mut self, spots: &[Spot]) -> Result<(), Self::Error>;

    /// Every active vehicle with its session.
    fn load_active(&self) -> Result<Vec<(Vehicle, Session)>, Self::Error>;

    fn find_vehicle(&self, plate: &LicensePlate) -> Result<Option<Vehicle>, Self::Error>;

    fn find_session(&self, plate: &LicensePlate) -> Result<Option<Session>, Self::Error>;

    /// Sum of the plate's unpaid fines in the external ledger.
    fn unpaid_fines(&self, plate: &LicensePlate) -> Result<Money, Self::Error>;

    fn load_fine_policy(&self) -> Result<Option<FinePolicy>, Self::Error>;

    fn save_fine_policy(&mut self, policy: FinePolicy) -> Result<(), Self::Error>;

    /// Records the vehicle and session and marks the session's spot occupied.
    fn commit_entry(&mut self, vehicle: &Vehicle, session: &Session) -> Result<(), Self::Error>;

    /// Appends the payment, frees the spot and deletes the session and vehicle.
    fn commit_exit(&mut self, exit: &ExitCommit<'_>) -> Result<(), Self::Error>;
}

/// Errors from [`MemoryStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// Simulated outage, see [`MemoryStore::set_unavailable`].
    #[error("store unavailable")]
    Unavailable,
    #[error("payment {0} already recorded")]
    DuplicatePayment(PaymentId),
    #[error("spot {0} is not in the layout")]
    UnknownSpot(SpotId),
    #[error("spot {0} is already occupied")]
    SpotUnavailable(SpotId),
}

/// In-memory [`Store`], used in tests and for ephemeral lots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    spots: BTreeMap<SpotId, Spot>,
    vehicles: HashMap<LicensePlate, Vehicle>,
    sessions: HashMap<LicensePlate, Session>,
    payments: Vec<Payment>,
    fines: HashMap<LicensePlate, Money>,
    fine_policy: Option<FinePolicy>,
    unavailable: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`MemoryStoreError::Unavailable`].
    pub const fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Adds an unpaid fine to the ledger.
    pub fn add_fine(&mut self, plate: &LicensePlate, amount: Money) {
        *self.fines.entry(plate.clone()).or_default() += amount;
    }

    /// Payments in the order they were recorded.
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn spot(&self, id: &SpotId) -> Option<&Spot> {
        self.spots.get(id)
    }

    const fn check_available(&self) -> Result<(), MemoryStoreError> {
        if self.unavailable {
            Err(MemoryStoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Store for MemoryStore {
    type Error = MemoryStoreError;

    fn load_spots(&self) -> Result<Vec<Spot>, Self::Error> {
        self.check_available()?;
        Ok(self.spots.values().cloned().collect())
    }

    fn save_spots(&mut self, spots: &[Spot]) -> Result<(), Self::Error> {
        self.check_available()?;
        for spot in spots {
            self.spots.insert(spot.id, spot.clone());
        }
        Ok(())
    }

    fn save_occupancy(&mut self, spots: &[Spot]) -> Result<(), Self::Error> {
        self.check_available()?;
        if let Some(missing) = spots.iter().find(|spot| !self.spots.contains_key(&spot.id)) {
            return Err(MemoryStoreError::UnknownSpot(missing.id));
        }
        for spot in spots {
            if let Some(stored) = self.spots.get_mut(&spot.id) {
                stored.occupant.clone_from(&spot.occupant);
            }
        }
        Ok(())
    }

    fn load_active(&self) -> Result<Vec<(Vehicle, Session)>, Self::Error> {
        self.check_available()?;
        let mut active: Vec<(Vehicle, Session)> = self
            .sessions
            .values()
            .filter_map(|session| {
                self.vehicles
                    .get(&session.plate)
                    .map(|vehicle| (vehicle.clone(), session.clone()))
            })
            .collect();
        active.sort_by(|a, b| {
            a.1.entry_time
                .cmp(&b.1.entry_time)
                .then(a.1.plate.cmp(&b.1.plate))
        });
        Ok(active)
    }

    fn find_vehicle(&self, plate: &LicensePlate) -> Result<Option<Vehicle>, Self::Error> {
        self.check_available()?;
        Ok(self.vehicles.get(plate).cloned())
    }

    fn find_session(&self, plate: &LicensePlate) -> Result<Option<Session>, Self::Error> {
        self.check_available()?;
        Ok(self.sessions.get(plate).cloned())
    }

    fn unpaid_fines(&self, plate: &LicensePlate) -> Result<Money, Self::Error> {
        self.check_available()?;
        Ok(self.fines.get(plate).copied().unwrap_or_default())
    }

    fn load_fine_policy(&self) -> Result<Option<FinePolicy>, Self::Error> {
        self.check_available()?;
        Ok(self.fine_policy)
    }

    fn save_fine_policy(&mut self, policy: FinePolicy) -> Result<(), Self::Error> {
        self.check_available()?;
        self.fine_policy = Some(policy);
        Ok(())
    }

    fn commit_entry(&mut self, vehicle: &Vehicle, session: &Session) -> Result<(), Self::Error> {
        self.check_available()?;
        let spot = self
            .spots
            .get_mut(&session.spot)
            .ok_or(MemoryStoreError::UnknownSpot(session.spot))?;
        if spot.occupant.is_some() {
            return Err(MemoryStoreError::SpotUnavailable(session.spot));
        }
        spot.occupant = Some(vehicle.plate.clone());
        self.vehicles.insert(vehicle.plate.clone(), vehicle.clone());
        self.sessions.insert(session.plate.clone(), session.clone());
        Ok(())
    }

    fn commit_exit(&mut self, exit: &ExitCommit<'_>) -> Result<(), Self::Error> {
        self.check_available()?;
        if self.payments.iter().any(|p| p.id == exit.payment.id) {
            return Err(MemoryStoreError::DuplicatePayment(exit.payment.id.clone()));
        }
        let spot = self
            .spots
            .get_mut(&exit.session.spot)
            .ok_or(MemoryStoreError::UnknownSpot(exit.session.spot))?;
        spot.occupant = None;
        self.payments.push(exit.payment.clone());
        self.sessions.remove(&exit.session.plate);
        self.vehicles.remove(&exit.session.plate);
        if exit.settle_fines {
            self.fines.remove(&exit.session.plate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    use crate::category::{SpotCategory, VehicleCategory};

    fn parked(plate: &str, spot: SpotId) -> (Vehicle, Session) {
        let vehicle = Vehicle {
            plate: LicensePlate::new(plate).unwrap(),
            category: VehicleCategory::Car,
            has_accessibility_card: false,
            entry_time: Utc.with_ymd_and_hms(2025, 1, 30, 10, 0, 0).unwrap(),
        };
        let session = Session::start(&vehicle, spot);
        (vehicle, session)
    }

    #[test]
    fn commit_entry_rejects_occupied_spot() {
        let id = SpotId::new(1, 1, 1);
        let mut store = MemoryStore::new();
        store
            .save_spots(&[Spot::new(id, SpotCategory::Compact)])
            .unwrap();

        let (vehicle, session) = parked("ABC123", id);
        store.commit_entry(&vehicle, &session).unwrap();

        let (other, other_session) = parked("XYZ789", id);
        assert_eq!(
            store.commit_entry(&other, &other_session),
            Err(MemoryStoreError::SpotUnavailable(id))
        );
        assert_eq!(store.spot(&id).unwrap().occupant, Some(vehicle.plate));
        assert!(store.find_session(&other.plate).unwrap().is_none());
    }

    #[test]
    fn save_occupancy_is_all_or_nothing() {
        let id = SpotId::new(1, 1, 1);
        let mut store = MemoryStore::new();
        store
            .save_spots(&[Spot::new(id, SpotCategory::Compact)])
            .unwrap();

        let mut ghost = Spot::new(id, SpotCategory::Compact);
        ghost.occupant = Some(LicensePlate::new("GHOST1").unwrap());
        let unknown = Spot::new(SpotId::new(2, 1, 1), SpotCategory::Compact);
        assert_eq!(
            store.save_occupancy(&[ghost.clone(), unknown]),
            Err(MemoryStoreError::UnknownSpot(SpotId::new(2, 1, 1)))
        );
        assert!(store.spot(&id).unwrap().is_free());

        store.save_occupancy(&[ghost]).unwrap();
        assert!(!store.spot(&id).unwrap().is_free());
    }
}
