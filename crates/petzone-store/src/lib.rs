#![forbid(unsafe_code)]

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

mod appointments;
mod cart;
mod catalog;
mod checkout;
mod content;
pub mod password;
mod reservations;
mod schema;
mod stats;
mod users;

pub use appointments::{
    AppointmentFilter, AppointmentInput, AppointmentPage, AppointmentStats, ServiceRequestCount,
};
pub use catalog::{ProductFilter, ProductInput};
pub use checkout::{CheckoutInput, OrderPage};
pub use content::{AnnouncementInput, SliderInput, ACTIVE_SLIDER_LIMIT};
pub use reservations::{ReservationInput, SlotAvailability, SLOT_CAPACITY};
pub use stats::{CategorySales, DashboardStats, MonthlySales, ServiceLoad, TopProduct};
pub use users::ActivityEntry;

pub const CRATE_NAME: &str = "petzone-store";

/// Attempts before giving up when a freshly generated code collides with
/// an existing row.
pub(crate) const CODE_RETRY_MAX: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        product_name: String,
        requested: u32,
        available: i64,
    },
    #[error("cart is empty")]
    EmptyCart,
    #[error("slot {slot} for service {service_id} is fully booked")]
    SlotUnavailable { service_id: i64, slot: String },
    #[error("{0}")]
    Conflict(String),
    #[error("stored value failed validation: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Single-connection SQLite store. Callers run operations through a shared
/// handle; the inner mutex serializes access, which is the supported mode
/// for one `rusqlite::Connection`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::prepare(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Corrupt("connection mutex poisoned".to_string()))
    }
}

/// Adapts a domain validation failure inside a row-mapping closure to the
/// error type `query_map` expects.
pub(crate) fn bad_column<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Storage form for timestamps, UTC `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn now_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
