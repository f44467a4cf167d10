//! Storage layer for the parking lot.
//!
//! Provides persistence for spots, active vehicles and sessions, payments,
//! the unpaid-fines ledger and lot settings using `rusqlite`. [`Database`]
//! implements [`pk_core::Store`], so a [`pk_core::ParkingLot`] can run on top
//! of it directly.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! `ParkingLot` already serializes access behind its own mutex; reporting
//! code that runs outside a lot should open a separate `Database`.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision (e.g., `2025-01-30T10:00:00.000Z`), so lexicographic ordering
//! matches chronological ordering.
//!
//! ## Money
//!
//! Amounts are stored as INTEGER cents in columns suffixed `_cents`.
//!
//! ## Transactions
//!
//! Entry and exit each run in a single SQLite transaction. Either every row
//! of the commit is written or none is.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use pk_core::{
    ExitCommit, FinePolicy, LicensePlate, Money, Payment, PaymentId, PaymentMethod, Session,
    SessionId, Spot, SpotCategory, SpotId, Store, Vehicle, VehicleCategory,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;

const FINE_POLICY_KEY: &str = "fine_policy";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record}: {timestamp}")]
    TimestampParse {
        record: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row does not decode into a domain value.
    #[error("invalid stored data for {record}: {message}")]
    InvalidRecord { record: String, message: String },
    /// The spot was already taken when the entry tried to claim it.
    #[error("spot {spot} is not free")]
    SpotUnavailable { spot: SpotId },
    /// The spot referenced by a commit is not in the layout.
    #[error("spot {spot} does not exist")]
    UnknownSpot { spot: SpotId },
    /// Fines must be positive.
    #[error("fine amount must be positive, got {0}")]
    InvalidFineAmount(Money),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// Settlement state of a ledger fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineStatus {
    Unpaid,
    Paid,
}

impl FineStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

/// A fine in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineRecord {
    pub id: i64,
    pub plate: LicensePlate,
    pub amount: Money,
    pub reason: String,
    pub status: FineStatus,
    pub issued_at: DateTime<Utc>,
    /// Payment that settled the fine.
    pub paid_by: Option<PaymentId>,
}

/// Payment totals for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRevenue {
    pub method: PaymentMethod,
    pub payments: i64,
    pub total: Money,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- Spots: the layout, plus the plate of the current occupant
            -- id: location key (e.g., 'F1-R2-S6')
            CREATE TABLE IF NOT EXISTS spots (
                id TEXT PRIMARY KEY,
                floor INTEGER NOT NULL,
                row_number INTEGER NOT NULL,
                spot_index INTEGER NOT NULL,
                category TEXT NOT NULL,
                hourly_rate_cents INTEGER NOT NULL,
                occupant TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_spots_location ON spots(floor, row_number, spot_index);

            CREATE TABLE IF NOT EXISTS vehicles (
                plate TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                has_accessibility_card INTEGER NOT NULL DEFAULT 0,
                entry_time TEXT NOT NULL
            );

            -- Sessions: one row per parked vehicle, at most one per spot
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                plate TEXT NOT NULL UNIQUE,
                spot_id TEXT NOT NULL UNIQUE,
                entry_time TEXT NOT NULL,
                FOREIGN KEY (plate) REFERENCES vehicles(plate) ON DELETE CASCADE,
                FOREIGN KEY (spot_id) REFERENCES spots(id) ON DELETE RESTRICT
            );

            -- Payments: append-only
            CREATE TABLE IF NOT EXISTS payments (
                id TEXT PRIMARY KEY,
                plate TEXT NOT NULL,
                session_id TEXT NOT NULL,
                parking_fee_cents INTEGER NOT NULL,
                fine_cents INTEGER NOT NULL,
                total_cents INTEGER NOT NULL,
                method TEXT NOT NULL,
                paid_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_payments_plate ON payments(plate);
            CREATE INDEX IF NOT EXISTS idx_payments_paid_at ON payments(paid_at);

            -- Fines: ledger of penalties issued outside a session
            -- status: 'unpaid' or 'paid'; paid_by: payment that settled it
            CREATE TABLE IF NOT EXISTS fines (
                id INTEGER PRIMARY KEY,
                plate TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'unpaid',
                issued_at TEXT NOT NULL,
                paid_by TEXT,
                FOREIGN KEY (paid_by) REFERENCES payments(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_fines_plate_status ON fines(plate, status);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Adds an unpaid fine for `plate` and returns its ledger id.
    pub fn add_fine(
        &mut self,
        plate: &LicensePlate,
        amount: Money,
        reason: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        if amount.is_negative() || amount.is_zero() {
            return Err(DbError::InvalidFineAmount(amount));
        }
        self.conn.execute(
            "
            INSERT INTO fines (plate, amount_cents, reason, status, issued_at)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                plate.as_str(),
                amount.cents(),
                reason,
                FineStatus::Unpaid.as_str(),
                format_timestamp(issued_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(plate = %plate, amount = %amount, id, "fine recorded");
        Ok(id)
    }

    /// Lists fines ordered by issue time then id, optionally for one plate.
    pub fn list_fines(
        &self,
        plate: Option<&LicensePlate>,
        unpaid_only: bool,
    ) -> Result<Vec<FineRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, plate, amount_cents, reason, status, issued_at, paid_by
            FROM fines
            WHERE (?1 IS NULL OR plate = ?1)
              AND (?2 = 0 OR status = 'unpaid')
            ORDER BY issued_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![plate.map(LicensePlate::as_str), unpaid_only], |row| {
            Ok(FineRow {
                id: row.get(0)?,
                plate: row.get(1)?,
                amount_cents: row.get(2)?,
                reason: row.get(3)?,
                status: row.get(4)?,
                issued_at: row.get(5)?,
                paid_by: row.get(6)?,
            })
        })?;
        let mut fines = Vec::new();
        for row in rows {
            fines.push(row?.into_record()?);
        }
        Ok(fines)
    }

    /// Lists payments ordered by payment time then id, optionally for one plate.
    pub fn list_payments(&self, plate: Option<&LicensePlate>) -> Result<Vec<Payment>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, plate, session_id, parking_fee_cents, fine_cents, total_cents, method, paid_at
            FROM payments
            WHERE (?1 IS NULL OR plate = ?1)
            ORDER BY paid_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![plate.map(LicensePlate::as_str)], |row| {
            Ok(PaymentRow {
                id: row.get(0)?,
                plate: row.get(1)?,
                session_id: row.get(2)?,
                parking_fee_cents: row.get(3)?,
                fine_cents: row.get(4)?,
                total_cents: row.get(5)?,
                method: row.get(6)?,
                paid_at: row.get(7)?,
            })
        })?;
        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.into_payment()?);
        }
        Ok(payments)
    }

    /// Payment count and total per method, in method order.
    pub fn revenue_by_method(&self) -> Result<Vec<MethodRevenue>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT method, COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM payments
            GROUP BY method
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut revenue = Vec::new();
        for row in rows {
            let (method, payments, total_cents) = row?;
            revenue.push(MethodRevenue {
                method: parse_method(&method, "payments")?,
                payments,
                total: Money::from_cents(total_cents),
            });
        }
        revenue.sort_by_key(|r| PaymentMethod::ALL.iter().position(|m| *m == r.method));
        Ok(revenue)
    }

    fn spot_occupied_by(&self, spot: &SpotId) -> Result<Option<Option<String>>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT occupant FROM spots WHERE id = ?",
                [spot.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?)
    }
}

impl Store for Database {
    type Error = DbError;

    fn load_spots(&self) -> Result<Vec<Spot>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, floor, row_number, spot_index, category, hourly_rate_cents, occupant
            FROM spots
            ORDER BY floor ASC, row_number ASC, spot_index ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SpotRow {
                id: row.get(0)?,
                floor: row.get(1)?,
                row_number: row.get(2)?,
                spot_index: row.get(3)?,
                category: row.get(4)?,
                hourly_rate_cents: row.get(5)?,
                occupant: row.get(6)?,
            })
        })?;
        let mut spots = Vec::new();
        for row in rows {
            spots.push(row?.into_spot()?);
        }
        Ok(spots)
    }

    fn save_spots(&mut self, spots: &[Spot]) -> Result<(), DbError> {
        if spots.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO spots (id, floor, row_number, spot_index, category, hourly_rate_cents, occupant)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    category = excluded.category,
                    hourly_rate_cents = excluded.hourly_rate_cents
                ",
            )?;
            for spot in spots {
                stmt.execute(params![
                    spot.id.to_string(),
                    spot.id.floor(),
                    spot.id.row(),
                    spot.id.index(),
                    spot.category.as_str(),
                    spot.hourly_rate.cents(),
                    spot.occupant.as_ref().map(LicensePlate::as_str),
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = spots.len(), "spots saved");
        Ok(())
    }

    fn save_occupancy(&mut self, spots: &[Spot]) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        for spot in spots {
            let updated = tx.execute(
                "UPDATE spots SET occupant = ? WHERE id = ?",
                params![
                    spot.occupant.as_ref().map(LicensePlate::as_str),
                    spot.id.to_string()
                ],
            )?;
            if updated != 1 {
                return Err(DbError::UnknownSpot { spot: spot.id });
            }
        }
        tx.commit()?;
        debug!(count = spots.len(), "spot occupancy saved");
        Ok(())
    }

    fn load_active(&self) -> Result<Vec<(Vehicle, Session)>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT v.plate, v.category, v.has_accessibility_card, v.entry_time,
                   s.id, s.spot_id, s.entry_time
            FROM sessions s
            JOIN vehicles v ON v.plate = s.plate
            ORDER BY s.entry_time ASC, s.plate ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((VehicleRow::from_row(row, 0)?, SessionRow {
                id: row.get(4)?,
                plate: row.get(0)?,
                spot_id: row.get(5)?,
                entry_time: row.get(6)?,
            }))
        })?;
        let mut active = Vec::new();
        for row in rows {
            let (vehicle, session) = row?;
            active.push((vehicle.into_vehicle()?, session.into_session()?));
        }
        Ok(active)
    }

    fn find_vehicle(&self, plate: &LicensePlate) -> Result<Option<Vehicle>, DbError> {
        self.conn
            .query_row(
                "
                SELECT plate, category, has_accessibility_card, entry_time
                FROM vehicles
                WHERE plate = ?
                ",
                [plate.as_str()],
                |row| VehicleRow::from_row(row, 0),
            )
            .optional()?
            .map(VehicleRow::into_vehicle)
            .transpose()
    }

    fn find_session(&self, plate: &LicensePlate) -> Result<Option<Session>, DbError> {
        self.conn
            .query_row(
                "SELECT id, plate, spot_id, entry_time FROM sessions WHERE plate = ?",
                [plate.as_str()],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        plate: row.get(1)?,
                        spot_id: row.get(2)?,
                        entry_time: row.get(3)?,
                    })
                },
            )
            .optional()?
            .map(SessionRow::into_session)
            .transpose()
    }

    fn unpaid_fines(&self, plate: &LicensePlate) -> Result<Money, DbError> {
        let cents: i64 = self.conn.query_row(
            "
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM fines
            WHERE plate = ? AND status = 'unpaid'
            ",
            [plate.as_str()],
            |row| row.get(0),
        )?;
        Ok(Money::from_cents(cents))
    }

    fn load_fine_policy(&self) -> Result<Option<FinePolicy>, DbError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [FINE_POLICY_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|value| parse_field::<FinePolicy>(&value, "settings.fine_policy"))
            .transpose()
    }

    fn save_fine_policy(&mut self, policy: FinePolicy) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![FINE_POLICY_KEY, policy.as_str()],
        )?;
        Ok(())
    }

    fn commit_entry(&mut self, vehicle: &Vehicle, session: &Session) -> Result<(), DbError> {
        let spot_key = session.spot.to_string();
        match self.spot_occupied_by(&session.spot)? {
            None => return Err(DbError::UnknownSpot { spot: session.spot }),
            Some(Some(_)) => return Err(DbError::SpotUnavailable { spot: session.spot }),
            Some(None) => {}
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO vehicles (plate, category, has_accessibility_card, entry_time)
            VALUES (?, ?, ?, ?)
            ",
            params![
                vehicle.plate.as_str(),
                vehicle.category.as_str(),
                vehicle.has_accessibility_card,
                format_timestamp(vehicle.entry_time),
            ],
        )?;
        tx.execute(
            "INSERT INTO sessions (id, plate, spot_id, entry_time) VALUES (?, ?, ?, ?)",
            params![
                session.id.as_str(),
                session.plate.as_str(),
                spot_key,
                format_timestamp(session.entry_time),
            ],
        )?;
        let claimed = tx.execute(
            "UPDATE spots SET occupant = ? WHERE id = ? AND occupant IS NULL",
            params![vehicle.plate.as_str(), spot_key],
        )?;
        if claimed != 1 {
            return Err(DbError::SpotUnavailable { spot: session.spot });
        }
        tx.commit()?;
        debug!(plate = %vehicle.plate, spot = %session.spot, "entry committed");
        Ok(())
    }

    fn commit_exit(&mut self, exit: &ExitCommit<'_>) -> Result<(), DbError> {
        let payment = exit.payment;
        let session = exit.session;
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO payments
            (id, plate, session_id, parking_fee_cents, fine_cents, total_cents, method, paid_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                payment.id.as_str(),
                payment.plate.as_str(),
                payment.session_id.as_str(),
                payment.parking_fee.cents(),
                payment.fine.cents(),
                payment.total.cents(),
                payment.method.as_str(),
                format_timestamp(payment.paid_at),
            ],
        )?;
        tx.execute("DELETE FROM sessions WHERE plate = ?", [session.plate.as_str()])?;
        tx.execute("DELETE FROM vehicles WHERE plate = ?", [session.plate.as_str()])?;
        let released = tx.execute(
            "UPDATE spots SET occupant = NULL WHERE id = ?",
            [session.spot.to_string()],
        )?;
        if released != 1 {
            return Err(DbError::UnknownSpot { spot: session.spot });
        }
        if exit.settle_fines {
            let settled = tx.execute(
                "
                UPDATE fines SET status = 'paid', paid_by = ?
                WHERE plate = ? AND status = 'unpaid'
                ",
                params![payment.id.as_str(), session.plate.as_str()],
            )?;
            debug!(plate = %session.plate, settled, "fines settled");
        }
        tx.commit()?;
        debug!(plate = %session.plate, payment = %payment.id, "exit committed");
        Ok(())
    }
}

struct SpotRow {
    id: String,
    floor: u32,
    row_number: u32,
    spot_index: u32,
    category: String,
    hourly_rate_cents: i64,
    occupant: Option<String>,
}

impl SpotRow {
    fn into_spot(self) -> Result<Spot, DbError> {
        let record = format!("spot {}", self.id);
        let id = SpotId::new(self.floor, self.row_number, self.spot_index);
        if id.to_string() != self.id {
            return Err(DbError::InvalidRecord {
                record,
                message: format!("location columns give {id}"),
            });
        }
        Ok(Spot {
            id,
            category: parse_field::<SpotCategory>(&self.category, &record)?,
            hourly_rate: Money::from_cents(self.hourly_rate_cents),
            occupant: self
                .occupant
                .as_deref()
                .map(|plate| parse_plate(plate, &record))
                .transpose()?,
        })
    }
}

struct VehicleRow {
    plate: String,
    category: String,
    has_accessibility_card: bool,
    entry_time: String,
}

impl VehicleRow {
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            plate: row.get(offset)?,
            category: row.get(offset + 1)?,
            has_accessibility_card: row.get(offset + 2)?,
            entry_time: row.get(offset + 3)?,
        })
    }

    fn into_vehicle(self) -> Result<Vehicle, DbError> {
        let record = format!("vehicle {}", self.plate);
        Ok(Vehicle {
            plate: parse_plate(&self.plate, &record)?,
            category: parse_field::<VehicleCategory>(&self.category, &record)?,
            has_accessibility_card: self.has_accessibility_card,
            entry_time: parse_timestamp(&self.entry_time, &record)?,
        })
    }
}

struct SessionRow {
    id: String,
    plate: String,
    spot_id: String,
    entry_time: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session, DbError> {
        let record = format!("session {}", self.id);
        Ok(Session {
            id: SessionId::new(self.id.as_str()).map_err(|err| invalid(&record, &err))?,
            plate: parse_plate(&self.plate, &record)?,
            spot: self
                .spot_id
                .parse::<SpotId>()
                .map_err(|err| invalid(&record, &err))?,
            entry_time: parse_timestamp(&self.entry_time, &record)?,
        })
    }
}

struct PaymentRow {
    id: String,
    plate: String,
    session_id: String,
    parking_fee_cents: i64,
    fine_cents: i64,
    total_cents: i64,
    method: String,
    paid_at: String,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, DbError> {
        let record = format!("payment {}", self.id);
        Ok(Payment {
            id: PaymentId::new(self.id.as_str()).map_err(|err| invalid(&record, &err))?,
            plate: parse_plate(&self.plate, &record)?,
            session_id: SessionId::new(self.session_id).map_err(|err| invalid(&record, &err))?,
            parking_fee: Money::from_cents(self.parking_fee_cents),
            fine: Money::from_cents(self.fine_cents),
            total: Money::from_cents(self.total_cents),
            method: parse_method(&self.method, &record)?,
            paid_at: parse_timestamp(&self.paid_at, &record)?,
        })
    }
}

struct FineRow {
    id: i64,
    plate: String,
    amount_cents: i64,
    reason: String,
    status: String,
    issued_at: String,
    paid_by: Option<String>,
}

impl FineRow {
    fn into_record(self) -> Result<FineRecord, DbError> {
        let record = format!("fine {}", self.id);
        let status = match self.status.as_str() {
            "unpaid" => FineStatus::Unpaid,
            "paid" => FineStatus::Paid,
            other => {
                return Err(DbError::InvalidRecord {
                    record,
                    message: format!("unknown status {other:?}"),
                });
            }
        };
        Ok(FineRecord {
            id: self.id,
            plate: parse_plate(&self.plate, &record)?,
            amount: Money::from_cents(self.amount_cents),
            reason: self.reason,
            status,
            issued_at: parse_timestamp(&self.issued_at, &record)?,
            paid_by: self
                .paid_by
                .map(PaymentId::new)
                .transpose()
                .map_err(|err| invalid(&record, &err))?,
        })
    }
}

fn invalid(record: &str, err: &dyn std::fmt::Display) -> DbError {
    DbError::InvalidRecord {
        record: record.to_string(),
        message: err.to_string(),
    }
}

fn parse_field<T>(value: &str, record: &str) -> Result<T, DbError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| invalid(record, &err))
}

fn parse_plate(value: &str, record: &str) -> Result<LicensePlate, DbError> {
    LicensePlate::new(value).map_err(|err| invalid(record, &err))
}

fn parse_method(value: &str, record: &str) -> Result<PaymentMethod, DbError> {
    parse_field(value, record)
}

fn parse_timestamp(timestamp: &str, record: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record: record.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
