//! Errors surfaced by the allocation and billing engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::category::{SpotCategory, VehicleCategory};
use crate::types::{LicensePlate, SpotId, ValidationError};

/// Boxed error from a [`crate::Store`] implementation.
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of lot operations.
///
/// None of these are retried. Every variant carries the plate, spot or value
/// needed to tell the user exactly what went wrong.
#[derive(Debug, Error)]
pub enum ParkingError {
    /// Malformed input (plate, amount, key, category).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("vehicle {plate} is already parked")]
    DuplicateVehicle { plate: LicensePlate },

    #[error("spot {spot} not found")]
    SpotNotFound { spot: SpotId },

    #[error("spot {spot} is already occupied by {occupant}")]
    SpotOccupied {
        spot: SpotId,
        occupant: LicensePlate,
    },

    #[error("a {vehicle} cannot park in {spot} ({spot_category} spot)")]
    IncompatibleCategory {
        spot: SpotId,
        vehicle: VehicleCategory,
        spot_category: SpotCategory,
    },

    #[error("no available spot for a {category}")]
    NoAvailableSpot { category: VehicleCategory },

    #[error("vehicle {plate} not found")]
    VehicleNotFound { plate: LicensePlate },

    #[error("exit time {exit} is before entry time {entry}")]
    InvalidInterval {
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    },

    #[error("invalid payment: {reason}")]
    PaymentValidation { reason: String },

    /// The backing store failed; the operation was not applied.
    #[error("storage failure: {source}")]
    Infrastructure {
        #[source]
        source: StoreFailure,
    },
}

impl ParkingError {
    /// Wraps a store error.
    pub fn infrastructure<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Infrastructure {
            source: Box::new(error),
        }
    }
}
