//! The parking lot: entry and exit transactions over a registry and a store.
//!
//! All mutable state (spot occupancy, the active-session index, the fine
//! policy and the store handle) sits behind one mutex. A transaction takes
//! the lock, validates, commits to the store, and only then applies the
//! change in memory. A failed commit therefore leaves both sides untouched.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::billing::{Bill, compose_bill};
use crate::category::{SpotCategory, VehicleCategory, effective_rate};
use crate::clock::{Clock, SystemClock};
use crate::error::ParkingError;
use crate::fine::FinePolicy;
use crate::records::{Payment, PaymentMethod, Receipt, Session, Vehicle};
use crate::registry::{FloorStats, OccupancyStats, Registry, Spot};
use crate::store::{ExitCommit, Store};
use crate::types::{LicensePlate, Money, SpotId};

/// Input for [`ParkingLot::open_session`].
#[derive(Debug, Clone)]
pub struct EntryRequest<'a> {
    /// Raw plate as typed; normalized before use.
    pub plate: &'a str,
    pub category: VehicleCategory,
    /// Ignored unless `category` is [`VehicleCategory::Accessible`].
    pub has_accessibility_card: bool,
    /// Spot to use instead of the first available one.
    pub preferred_spot: Option<SpotId>,
}

impl<'a> EntryRequest<'a> {
    #[must_use]
    pub const fn new(plate: &'a str, category: VehicleCategory) -> Self {
        Self {
            plate,
            category,
            has_accessibility_card: false,
            preferred_spot: None,
        }
    }

    #[must_use]
    pub const fn with_accessibility_card(mut self, has_card: bool) -> Self {
        self.has_accessibility_card = has_card;
        self
    }

    #[must_use]
    pub const fn with_preferred_spot(mut self, spot: Option<SpotId>) -> Self {
        self.preferred_spot = spot;
        self
    }
}

/// An active vehicle and its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkedVehicle {
    pub vehicle: Vehicle,
    pub session: Session,
}

/// A bill preview together with the session it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillPreview {
    pub session: Session,
    pub spot_category: SpotCategory,
    pub bill: Bill,
}

struct LotState<S> {
    store: S,
    registry: Registry,
    active: HashMap<LicensePlate, ParkedVehicle>,
    fine_policy: FinePolicy,
}

/// Coordinates entry, exit and billing for one lot.
pub struct ParkingLot<S, C = SystemClock> {
    clock: C,
    state: Mutex<LotState<S>>,
}

impl<S, C> std::fmt::Debug for ParkingLot<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingLot").finish_non_exhaustive()
    }
}

impl<S: Store, C: Clock> ParkingLot<S, C> {
    /// Restores a lot from `store`.
    ///
    /// Spot occupancy is rebuilt from the stored sessions, which are the
    /// source of truth: a spot marked occupied without a session comes back
    /// free, and a session whose spot is missing or taken is skipped. Both
    /// are logged, and spot rows that disagree with the rebuilt occupancy
    /// are rewritten so the store matches memory. The stored fine policy
    /// wins over `default_policy`.
    pub fn load(mut store: S, clock: C, default_policy: FinePolicy) -> Result<Self, ParkingError> {
        let spots = store.load_spots().map_err(ParkingError::infrastructure)?;
        let stored_occupancy: Vec<(SpotId, Option<LicensePlate>)> = spots
            .iter()
            .map(|spot| (spot.id, spot.occupant.clone()))
            .collect();
        let mut registry = Registry::from_spots(spots);
        registry.clear_occupancy();

        let mut active = HashMap::new();
        for (vehicle, session) in store.load_active().map_err(ParkingError::infrastructure)? {
            match registry.occupy(&session.spot, &vehicle) {
                Ok(()) => {
                    active.insert(session.plate.clone(), ParkedVehicle { vehicle, session });
                }
                Err(error) => {
                    warn!(
                        plate = %session.plate,
                        spot = %session.spot,
                        %error,
                        "skipping stored session that cannot be restored"
                    );
                }
            }
        }

        let mut repaired = Vec::new();
        for (id, stored) in stored_occupancy {
            let Ok(spot) = registry.find_by_id(&id) else {
                continue;
            };
            if stored != spot.occupant {
                warn!(
                    spot = %id,
                    stored = ?stored.as_ref().map(LicensePlate::as_str),
                    restored = ?spot.occupant.as_ref().map(LicensePlate::as_str),
                    "stored spot status disagrees with active sessions"
                );
                repaired.push(spot.clone());
            }
        }
        if !repaired.is_empty() {
            store
                .save_occupancy(&repaired)
                .map_err(ParkingError::infrastructure)?;
            info!(spots = repaired.len(), "stored spot status repaired");
        }

        let fine_policy = store
            .load_fine_policy()
            .map_err(ParkingError::infrastructure)?
            .unwrap_or(default_policy);

        info!(
            floors = registry.floor_count(),
            spots = registry.stats().total,
            active = active.len(),
            policy = fine_policy.as_str(),
            "lot loaded"
        );

        Ok(Self {
            clock,
            state: Mutex::new(LotState {
                store,
                registry,
                active,
                fine_policy,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LotState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a floor laid out with `count` spots per category, in order.
    ///
    /// Floors exist only through their spots, so an empty layout adds a
    /// floor that does not survive a reload.
    pub fn add_floor(&self, layout: &[(SpotCategory, u32)]) -> Result<u32, ParkingError> {
        let mut state = self.lock();
        let mut registry = state.registry.clone();
        let floor = registry.add_floor();
        let mut added = Vec::new();
        for &(category, count) in layout {
            for _ in 0..count {
                let id = registry.add_spot(floor, category)?;
                added.push(registry.find_by_id(&id)?.clone());
            }
        }
        state
            .store
            .save_spots(&added)
            .map_err(ParkingError::infrastructure)?;
        state.registry = registry;
        info!(floor, spots = added.len(), "floor added");
        Ok(floor)
    }

    /// Adds one spot to an existing floor, at `hourly_rate` or the category default.
    pub fn add_spot(
        &self,
        floor: u32,
        category: SpotCategory,
        hourly_rate: Option<Money>,
    ) -> Result<SpotId, ParkingError> {
        let mut state = self.lock();
        let mut registry = state.registry.clone();
        let id = registry.add_spot_with_rate(
            floor,
            category,
            hourly_rate.unwrap_or_else(|| category.default_rate()),
        )?;
        let spot = registry.find_by_id(&id)?.clone();
        state
            .store
            .save_spots(std::slice::from_ref(&spot))
            .map_err(ParkingError::infrastructure)?;
        state.registry = registry;
        info!(spot = %id, category = category.as_str(), "spot added");
        Ok(id)
    }

    /// Parks a vehicle and returns its session.
    ///
    /// Without a preferred spot the first free compatible spot in
    /// (floor, row, index) order is taken.
    pub fn open_session(&self, request: &EntryRequest<'_>) -> Result<Session, ParkingError> {
        let plate = LicensePlate::new(request.plate)?;
        let mut state = self.lock();

        if state.active.contains_key(&plate) {
            return Err(ParkingError::DuplicateVehicle { plate });
        }

        let vehicle = Vehicle {
            plate,
            category: request.category,
            has_accessibility_card: request.has_accessibility_card
                && request.category == VehicleCategory::Accessible,
            entry_time: self.clock.now(),
        };

        let spot = match request.preferred_spot {
            Some(id) => state.registry.check_occupy(&id, &vehicle)?.id,
            None => state
                .registry
                .find_available(vehicle.category)
                .first()
                .map(|spot| spot.id)
                .ok_or(ParkingError::NoAvailableSpot {
                    category: vehicle.category,
                })?,
        };

        let session = Session::start(&vehicle, spot);
        state
            .store
            .commit_entry(&vehicle, &session)
            .map_err(ParkingError::infrastructure)?;
        state.registry.occupy(&spot, &vehicle)?;

        info!(
            plate = %vehicle.plate,
            category = vehicle.category.as_str(),
            spot = %spot,
            session = %session.id,
            "vehicle entered"
        );
        state.active.insert(
            vehicle.plate.clone(),
            ParkedVehicle {
                vehicle,
                session: session.clone(),
            },
        );
        Ok(session)
    }

    /// Computes what the vehicle would owe if it left now. Changes nothing.
    pub fn preview_bill(&self, plate: &str) -> Result<BillPreview, ParkingError> {
        let plate = LicensePlate::new(plate)?;
        let state = self.lock();
        Self::bill_for(&state, &plate, self.clock.now())
    }

    /// Bills, records payment and frees the spot.
    ///
    /// Unpaid fines from the ledger are added to the bill and settled by the
    /// same commit.
    pub fn close_session(&self, plate: &str, method: &str) -> Result<Receipt, ParkingError> {
        let plate = LicensePlate::new(plate)?;
        let mut state = self.lock();

        let BillPreview {
            session,
            spot_category,
            bill,
        } = Self::bill_for(&state, &plate, self.clock.now())?;
        let method: PaymentMethod = method.parse()?;
        let payment = Payment::for_bill(&session, &bill, method)?;

        state
            .store
            .commit_exit(&ExitCommit {
                payment: &payment,
                session: &session,
                settle_fines: !bill.previous_fines.is_zero(),
            })
            .map_err(ParkingError::infrastructure)?;
        state.registry.release(&session.spot)?;
        state.active.remove(&plate);

        info!(
            plate = %plate,
            spot = %session.spot,
            hours = bill.duration_hours,
            total = %bill.total,
            method = method.as_str(),
            "vehicle exited"
        );
        Ok(Receipt::new(payment, session.spot, spot_category, &bill))
    }

    /// Re-reads the session and vehicle from the store and composes the bill.
    fn bill_for(
        state: &LotState<S>,
        plate: &LicensePlate,
        now: DateTime<Utc>,
    ) -> Result<BillPreview, ParkingError> {
        let not_found = || ParkingError::VehicleNotFound {
            plate: plate.clone(),
        };
        if !state.active.contains_key(plate) {
            return Err(not_found());
        }
        let session = state
            .store
            .find_session(plate)
            .map_err(ParkingError::infrastructure)?
            .ok_or_else(not_found)?;
        let vehicle = state
            .store
            .find_vehicle(plate)
            .map_err(ParkingError::infrastructure)?
            .ok_or_else(not_found)?;
        let spot = state.registry.find_by_id(&session.spot)?;
        let rate = effective_rate(
            spot.category,
            spot.hourly_rate,
            vehicle.category,
            vehicle.has_accessibility_card,
        );
        let previous_fines = state
            .store
            .unpaid_fines(plate)
            .map_err(ParkingError::infrastructure)?;
        let bill = compose_bill(
            session.entry_time,
            now,
            rate,
            state.fine_policy,
            previous_fines,
        )?;
        debug!(
            plate = %plate,
            hours = bill.duration_hours,
            fee = %bill.parking_fee,
            fine = %bill.fine,
            "bill computed"
        );
        Ok(BillPreview {
            session,
            spot_category: spot.category,
            bill,
        })
    }

    /// Free spots a vehicle of `category` may use, in (floor, row, index) order.
    pub fn list_available(&self, category: VehicleCategory) -> Vec<Spot> {
        self.lock()
            .registry
            .find_available(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn find_spot(&self, id: &SpotId) -> Result<Spot, ParkingError> {
        self.lock().registry.find_by_id(id).cloned()
    }

    pub fn occupancy_stats(&self) -> OccupancyStats {
        self.lock().registry.stats()
    }

    pub fn floor_stats(&self) -> Vec<FloorStats> {
        self.lock().registry.floor_stats()
    }

    /// Vehicles currently parked, oldest entry first.
    pub fn parked_vehicles(&self) -> Vec<ParkedVehicle> {
        let mut parked: Vec<ParkedVehicle> = self.lock().active.values().cloned().collect();
        parked.sort_by(|a, b| {
            a.session
                .entry_time
                .cmp(&b.session.entry_time)
                .then_with(|| a.session.plate.cmp(&b.session.plate))
        });
        parked
    }

    pub fn fine_policy(&self) -> FinePolicy {
        self.lock().fine_policy
    }

    /// Persists and activates `policy`, returning the one it replaced.
    ///
    /// Bills computed before the swap keep the old policy's fine.
    pub fn set_fine_policy(&self, policy: FinePolicy) -> Result<FinePolicy, ParkingError> {
        let mut state = self.lock();
        state
            .store
            .save_fine_policy(policy)
            .map_err(ParkingError::infrastructure)?;
        let previous = std::mem::replace(&mut state.fine_policy, policy);
        info!(
            from = previous.as_str(),
            to = policy.as_str(),
            "fine policy changed"
        );
        Ok(previous)
    }

    /// Runs `f` against the store while holding the lot lock.
    ///
    /// For ledger and reporting access only: writing spots, vehicles or
    /// sessions here bypasses the in-memory state.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut self.lock().store)
    }

    /// Consumes the lot and returns its store.
    pub fn into_store(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .store
    }
}
