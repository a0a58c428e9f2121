use crate::{bad_column, now_string, today, Store, StoreError, CODE_RETRY_MAX};
use chrono::Datelike;
use petzone_model::{Appointment, AppointmentCode, AppointmentStatus};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppointmentInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub search: Option<String>,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentPage {
    pub appointments: Vec<Appointment>,
    pub total: u64,
    pub page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequestCount {
    pub service: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub top_services: Vec<ServiceRequestCount>,
    pub recent_pending: Vec<Appointment>,
}

const APPOINTMENT_COLUMNS: &str =
    "id, code, name, email, phone, service, message, status, ip_address, requested_at";

fn map_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let code: String = row.get(1)?;
    let status: String = row.get(7)?;
    Ok(Appointment {
        id: row.get(0)?,
        code: AppointmentCode::parse(&code).map_err(|e| bad_column(1, e))?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        service: row.get(5)?,
        message: row.get(6)?,
        status: AppointmentStatus::parse(&status).map_err(|e| bad_column(7, e))?,
        ip_address: row.get(8)?,
        requested_at: row.get(9)?,
    })
}

impl Store {
    pub fn create_appointment(
        &self,
        input: &AppointmentInput,
    ) -> Result<Appointment, StoreError> {
        let conn = self.conn()?;
        let mut rng = rand::thread_rng();
        for _ in 0..CODE_RETRY_MAX {
            let code = AppointmentCode::generate(today(), &mut rng);
            let result = conn.execute(
                "INSERT INTO appointments
                   (code, name, email, phone, service, message, status, ip_address,
                    requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8)",
                params![
                    code.as_str(),
                    input.name,
                    input.email,
                    input.phone,
                    input.service,
                    input.message,
                    input.ip_address,
                    now_string(),
                ],
            );
            match result {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    drop(conn);
                    info!(code = %code, service = %input.service, "appointment requested");
                    return self.get_appointment(id);
                }
                Err(rusqlite::Error::SqliteFailure(f, _))
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    continue;
                }
                Err(e) => return Err(StoreError::Sqlite(e)),
            }
        }
        Err(StoreError::Conflict(
            "could not allocate a unique appointment code".to_string(),
        ))
    }

    pub fn get_appointment(&self, id: i64) -> Result<Appointment, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            map_appointment,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("appointment", id))
    }

    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<AppointmentPage, StoreError> {
        let conn = self.conn()?;
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            args.push(Box::new(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", args.len()));
        }
        if let Some(search) = &filter.search {
            args.push(Box::new(format!("%{search}%")));
            let idx = args.len();
            clauses.push(format!(
                "(name LIKE ?{idx} OR email LIKE ?{idx} OR phone LIKE ?{idx} OR code LIKE ?{idx})"
            ));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM appointments{where_sql}"),
            rusqlite::params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let limit = filter.limit.max(1);
        let offset = filter.page.saturating_sub(1) * limit;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments{where_sql}
             ORDER BY requested_at DESC, id DESC LIMIT {limit} OFFSET {offset}"
        ))?;
        let appointments = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map_appointment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let total = u64::try_from(total).unwrap_or(0);
        let pages = usize::try_from(total.div_ceil(limit as u64)).unwrap_or(usize::MAX);
        Ok(AppointmentPage {
            appointments,
            total,
            page: filter.page,
            pages,
        })
    }

    pub fn update_appointment(
        &self,
        id: i64,
        name: &str,
        email: &str,
        phone: &str,
        service: &str,
        message: Option<&str>,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE appointments
             SET name = ?1, email = ?2, phone = ?3, service = ?4, message = ?5, status = ?6
             WHERE id = ?7",
            params![name, email, phone, service, message, status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("appointment", id));
        }
        drop(conn);
        self.get_appointment(id)
    }

    pub fn set_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE appointments SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("appointment", id));
        }
        Ok(())
    }

    pub fn delete_appointment(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found("appointment", id));
        }
        Ok(())
    }

    pub fn appointment_stats(&self) -> Result<AppointmentStats, StoreError> {
        let conn = self.conn()?;
        let mut per_status = [0i64; 4];
        {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status")?;
            let rows = stmt.query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })?;
            for row in rows {
                let (status, count) = row?;
                match AppointmentStatus::parse(&status) {
                    Ok(AppointmentStatus::Pending) => per_status[0] = count,
                    Ok(AppointmentStatus::Confirmed) => per_status[1] = count,
                    Ok(AppointmentStatus::Completed) => per_status[2] = count,
                    Ok(AppointmentStatus::Cancelled) => per_status[3] = count,
                    Err(e) => return Err(StoreError::corrupt(e)),
                }
            }
        }

        let now = today();
        let week_start = now - chrono::Days::new(u64::from(now.weekday().num_days_from_monday()));
        let month_start = now.with_day(1).unwrap_or(now);
        let day_count = |since: &str| -> Result<i64, StoreError> {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM appointments WHERE substr(requested_at, 1, 10) >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(count)
        };
        let today_count = day_count(&now.format("%Y-%m-%d").to_string())?;
        let this_week = day_count(&week_start.format("%Y-%m-%d").to_string())?;
        let this_month = day_count(&month_start.format("%Y-%m-%d").to_string())?;

        let mut stmt = conn.prepare(
            "SELECT service, COUNT(*) AS n FROM appointments
             GROUP BY service ORDER BY n DESC, service LIMIT 5",
        )?;
        let top_services = stmt
            .query_map([], |row| {
                Ok(ServiceRequestCount {
                    service: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE status = 'pending'
             ORDER BY requested_at DESC, id DESC LIMIT 10"
        ))?;
        let recent_pending = stmt
            .query_map([], map_appointment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(AppointmentStats {
            total: per_status.iter().sum(),
            pending: per_status[0],
            confirmed: per_status[1],
            completed: per_status[2],
            cancelled: per_status[3],
            today: today_count,
            this_week,
            this_month,
            top_services,
            recent_pending,
        })
    }
}
