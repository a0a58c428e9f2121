use crate::{bad_column, now_string, today, Store, StoreError, CODE_RETRY_MAX};
use petzone_model::{
    Money, Reservation, ReservationCode, ReservationStatus, SlotTime,
};
use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::info;

/// Non-cancelled bookings allowed per (service, date, hour).
pub const SLOT_CAPACITY: i64 = 3;

#[derive(Debug, Clone)]
pub struct ReservationInput {
    pub service_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pet_name: String,
    pub pet_type: String,
    pub slot: SlotTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAvailability {
    pub available: bool,
    pub current: i64,
    pub capacity: i64,
}

const RESERVATION_COLUMNS: &str = "r.id, r.code, r.service_id, s.name, r.customer_name, \
     r.customer_email, r.customer_phone, r.pet_name, r.pet_type, r.date, r.hour, r.notes, \
     r.subtotal_cents, r.total_cents, r.status, r.created_at";

fn map_reservation(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    let code: String = row.get(1)?;
    let subtotal: i64 = row.get(12)?;
    let total: i64 = row.get(13)?;
    let status: String = row.get(14)?;
    Ok(Reservation {
        id: row.get(0)?,
        code: ReservationCode::parse(&code).map_err(|e| bad_column(1, e))?,
        service_id: row.get(2)?,
        service_name: row.get(3)?,
        customer_name: row.get(4)?,
        customer_email: row.get(5)?,
        customer_phone: row.get(6)?,
        pet_name: row.get(7)?,
        pet_type: row.get(8)?,
        date: row.get(9)?,
        hour: row.get(10)?,
        notes: row.get(11)?,
        subtotal: Money::from_cents(subtotal).map_err(|e| bad_column(12, e))?,
        total: Money::from_cents(total).map_err(|e| bad_column(13, e))?,
        status: ReservationStatus::parse(&status).map_err(|e| bad_column(14, e))?,
        created_at: row.get(15)?,
    })
}

impl Store {
    /// Books a slot. The capacity count and the insert share a transaction,
    /// so a full slot cannot be overbooked by interleaved requests.
    pub fn create_reservation(
        &self,
        input: &ReservationInput,
    ) -> Result<Reservation, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let service: Option<(i64, bool)> = tx
            .query_row(
                "SELECT price_cents, available FROM services WHERE id = ?1",
                params![input.service_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (price_cents, available) =
            service.ok_or_else(|| StoreError::not_found("service", input.service_id))?;
        if !available {
            return Err(StoreError::not_found("service", input.service_id));
        }

        let current = count_slot(&tx, input.service_id, &input.slot)?;
        if current >= SLOT_CAPACITY {
            return Err(StoreError::SlotUnavailable {
                service_id: input.service_id,
                slot: input.slot.to_string(),
            });
        }

        let code = insert_reservation(&tx, input, price_cents)?;
        tx.commit()?;
        drop(conn);

        info!(code = %code, service_id = input.service_id, slot = %input.slot, "reservation booked");
        self.get_reservation(&code)
    }

    pub fn slot_availability(
        &self,
        service_id: i64,
        slot: &SlotTime,
    ) -> Result<SlotAvailability, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM services WHERE id = ?1 AND available = 1",
                params![service_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::not_found("service", service_id));
        }
        let current = count_slot(&tx, service_id, slot)?;
        Ok(SlotAvailability {
            available: current < SLOT_CAPACITY,
            current,
            capacity: SLOT_CAPACITY,
        })
    }

    pub fn get_reservation(&self, code: &ReservationCode) -> Result<Reservation, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations r
                 LEFT JOIN services s ON s.id = r.service_id WHERE r.code = ?1"
            ),
            params![code.as_str()],
            map_reservation,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("reservation", code.as_str()))
    }

    /// Most recent bookings for the back office, capped at 100.
    pub fn list_recent_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r
             LEFT JOIN services s ON s.id = r.service_id
             ORDER BY r.created_at DESC, r.id DESC LIMIT 100"
        ))?;
        let rows = stmt.query_map([], map_reservation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_reservations_for_date(&self, date: &str) -> Result<Vec<Reservation>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r
             LEFT JOIN services s ON s.id = r.service_id
             WHERE r.date = ?1 ORDER BY r.hour, r.id"
        ))?;
        let rows = stmt.query_map(params![date], map_reservation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_reservation_status(
        &self,
        code: &ReservationCode,
        status: ReservationStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE reservations SET status = ?1 WHERE code = ?2",
            params![status.as_str(), code.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("reservation", code.as_str()));
        }
        Ok(())
    }

    /// Cancels and appends the customer's reason to the notes column.
    pub fn cancel_reservation(
        &self,
        code: &ReservationCode,
        reason: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = match reason {
            Some(reason) => conn.execute(
                "UPDATE reservations
                 SET status = 'cancelled',
                     notes = CASE WHEN notes IS NULL OR notes = ''
                             THEN ?1 ELSE notes || char(10) || ?1 END
                 WHERE code = ?2",
                params![format!("cancelled: {reason}"), code.as_str()],
            )?,
            None => conn.execute(
                "UPDATE reservations SET status = 'cancelled' WHERE code = ?1",
                params![code.as_str()],
            )?,
        };
        if changed == 0 {
            return Err(StoreError::not_found("reservation", code.as_str()));
        }
        Ok(())
    }
}

fn count_slot(
    tx: &Transaction<'_>,
    service_id: i64,
    slot: &SlotTime,
) -> Result<i64, StoreError> {
    let count = tx.query_row(
        "SELECT COUNT(*) FROM reservations
         WHERE service_id = ?1 AND date = ?2 AND hour = ?3 AND status != 'cancelled'",
        params![service_id, slot.date_string(), slot.hour_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn insert_reservation(
    tx: &Transaction<'_>,
    input: &ReservationInput,
    price_cents: i64,
) -> Result<ReservationCode, StoreError> {
    let mut rng = rand::thread_rng();
    for _ in 0..CODE_RETRY_MAX {
        let code = ReservationCode::generate(today(), &mut rng);
        let result = tx.execute(
            "INSERT INTO reservations
               (code, service_id, customer_name, customer_email, customer_phone, pet_name,
                pet_type, date, hour, notes, subtotal_cents, total_cents, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'pending', ?13)",
            params![
                code.as_str(),
                input.service_id,
                input.customer_name,
                input.customer_email,
                input.customer_phone,
                input.pet_name,
                input.pet_type,
                input.slot.date_string(),
                input.slot.hour_string(),
                input.notes,
                price_cents,
                price_cents,
                now_string(),
            ],
        );
        match result {
            Ok(_) => return Ok(code),
            Err(rusqlite::Error::SqliteFailure(f, _))
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                continue;
            }
            Err(e) => return Err(StoreError::Sqlite(e)),
        }
    }
    Err(StoreError::Conflict(
        "could not allocate a unique reservation code".to_string(),
    ))
}
