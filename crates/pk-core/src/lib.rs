//! Allocation and billing engine for a multi-floor parking lot.
//!
//! This crate contains the domain types and logic for:
//! - Registry: the floor → row → spot inventory and its occupancy
//! - Compatibility: which vehicle categories may use which spots, and the
//!   accessibility rate override ([`effective_rate`])
//! - Billing: duration rounding, fees and overstay fines
//! - Transactions: entry and exit through [`ParkingLot`] over a [`Store`]

pub mod billing;
pub mod category;
pub mod clock;
mod error;
pub mod fine;
mod lot;
pub mod records;
pub mod registry;
pub mod store;
pub mod types;

pub use billing::{Bill, compose_bill, duration_hours, parking_fee, total_bill};
pub use category::{SpotCategory, VehicleCategory, effective_rate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ParkingError, StoreFailure};
pub use fine::{FinePolicy, GRACE_HOURS};
pub use lot::{BillPreview, EntryRequest, ParkedVehicle, ParkingLot};
pub use records::{Payment, PaymentMethod, Receipt, Session, Vehicle};
pub use registry::{DEFAULT_FLOOR_LAYOUT, FloorStats, OccupancyStats, Registry, Spot, SpotStatus};
pub use store::{ExitCommit, MemoryStore, MemoryStoreError, Store};
pub use types::{LicensePlate, Money, PaymentId, SessionId, SpotId, ValidationError};
