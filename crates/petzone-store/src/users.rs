use crate::password::{hash_password, verify_password};
use crate::{now_string, Store, StoreError};
use petzone_model::{AdminUser, WebUser};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub username: String,
    pub module: String,
    pub action: String,
    pub detail: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
}

fn map_admin(row: &Row<'_>) -> rusqlite::Result<AdminUser> {
    Ok(AdminUser {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        last_login: row.get(5)?,
    })
}

fn map_web_user(row: &Row<'_>) -> rusqlite::Result<WebUser> {
    Ok(WebUser {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        registered_at: row.get(4)?,
    })
}

impl Store {
    pub fn create_admin_user(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
        role: &str,
    ) -> Result<AdminUser, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO admin_users (username, password_hash, full_name, role)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, hash_password(password), full_name, role],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("username already exists: {username}"))
            }
            other => StoreError::Sqlite(other),
        })?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_admin_user(id)
    }

    /// Deactivated accounts are invisible here, which also ends their
    /// existing sessions' profile lookups.
    pub fn get_admin_user(&self, id: i64) -> Result<AdminUser, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, username, full_name, email, role, last_login
             FROM admin_users WHERE id = ?1 AND active = 1",
            params![id],
            map_admin,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("admin user", id))
    }

    pub fn set_admin_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE admin_users SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("admin user", id));
        }
        Ok(())
    }

    /// Checks credentials and stamps `last_login` on success. The returned
    /// profile never carries the hash.
    pub fn verify_admin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminUser, StoreError> {
        let conn = self.conn()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM admin_users WHERE username = ?1 AND active = 1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((id, hash)) = row else {
            return Err(StoreError::not_found("admin user", username));
        };
        if !verify_password(password, &hash) {
            return Err(StoreError::not_found("admin user", username));
        }
        conn.execute(
            "UPDATE admin_users SET last_login = ?1 WHERE id = ?2",
            params![now_string(), id],
        )?;
        drop(conn);
        self.get_admin_user(id)
    }

    pub fn register_web_user(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password: &str,
    ) -> Result<WebUser, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO web_users (name, email, phone, password_hash, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, email, phone, hash_password(password), now_string()],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("email already registered: {email}"))
            }
            other => StoreError::Sqlite(other),
        })?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_web_user(id)
    }

    pub fn get_web_user(&self, id: i64) -> Result<WebUser, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, email, phone, registered_at FROM web_users WHERE id = ?1",
            params![id],
            map_web_user,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("account", id))
    }

    pub fn verify_web_login(&self, email: &str, password: &str) -> Result<WebUser, StoreError> {
        let conn = self.conn()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM web_users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((id, hash)) = row else {
            return Err(StoreError::not_found("account", email));
        };
        if !verify_password(password, &hash) {
            return Err(StoreError::not_found("account", email));
        }
        drop(conn);
        self.get_web_user(id)
    }

    /// Best-effort audit append. Failures are logged and swallowed so an
    /// audit hiccup never fails the admin action it describes.
    pub fn log_activity(
        &self,
        admin_id: Option<i64>,
        username: &str,
        module: &str,
        action: &str,
        detail: Option<&str>,
        ip_address: Option<&str>,
    ) {
        let result: Result<(), StoreError> = (|| {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO admin_activity
                   (admin_id, username, module, action, detail, ip_address, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![admin_id, username, module, action, detail, ip_address, now_string()],
            )?;
            Ok(())
        })();
        if let Err(err) = result {
            warn!(%err, action, "failed to record admin activity");
        }
    }

    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, admin_id, username, module, action, detail, ip_address, created_at
             FROM admin_activity ORDER BY created_at DESC, id DESC LIMIT {}",
            limit.max(1)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(ActivityEntry {
                id: row.get(0)?,
                admin_id: row.get(1)?,
                username: row.get(2)?,
                module: row.get(3)?,
                action: row.get(4)?,
                detail: row.get(5)?,
                ip_address: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
