use crate::{Store, StoreError};
use petzone_model::{Announcement, Slider};
use rusqlite::{params, OptionalExtension, Row};

#[derive(Debug, Clone)]
pub struct SliderInput {
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub link: Option<String>,
    pub position: String,
    pub sort_order: i64,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct AnnouncementInput {
    pub message: String,
    pub kind: String,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub icon: Option<String>,
    pub speed: i64,
    pub priority: i64,
    pub active: bool,
}

/// Storefront rotators render at most this many slides per position.
pub const ACTIVE_SLIDER_LIMIT: usize = 5;

fn map_slider(row: &Row<'_>) -> rusqlite::Result<Slider> {
    Ok(Slider {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        link: row.get(4)?,
        position: row.get(5)?,
        sort_order: row.get(6)?,
        active: row.get(7)?,
    })
}

fn map_announcement(row: &Row<'_>) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: row.get(0)?,
        message: row.get(1)?,
        kind: row.get(2)?,
        background_color: row.get(3)?,
        text_color: row.get(4)?,
        icon: row.get(5)?,
        speed: row.get(6)?,
        priority: row.get(7)?,
        active: row.get(8)?,
    })
}

const SLIDER_COLUMNS: &str = "id, title, description, image, link, position, sort_order, active";
const ANNOUNCEMENT_COLUMNS: &str =
    "id, message, kind, background_color, text_color, icon, speed, priority, active";

impl Store {
    pub fn list_sliders(&self) -> Result<Vec<Slider>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLIDER_COLUMNS} FROM sliders ORDER BY sort_order, id DESC"
        ))?;
        let rows = stmt.query_map([], map_slider)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn active_sliders(&self, position: &str) -> Result<Vec<Slider>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLIDER_COLUMNS} FROM sliders
             WHERE active = 1 AND position = ?1
             ORDER BY sort_order, id DESC LIMIT {ACTIVE_SLIDER_LIMIT}"
        ))?;
        let rows = stmt.query_map(params![position], map_slider)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_slider(&self, id: i64) -> Result<Slider, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {SLIDER_COLUMNS} FROM sliders WHERE id = ?1"),
            params![id],
            map_slider,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("slider", id))
    }

    pub fn create_slider(&self, input: &SliderInput) -> Result<Slider, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sliders (title, description, image, link, position, sort_order, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.title,
                input.description,
                input.image,
                input.link,
                input.position,
                input.sort_order,
                input.active,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_slider(id)
    }

    pub fn update_slider(&self, id: i64, input: &SliderInput) -> Result<Slider, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE sliders SET title = ?1, description = ?2, image = ?3, link = ?4,
               position = ?5, sort_order = ?6, active = ?7 WHERE id = ?8",
            params![
                input.title,
                input.description,
                input.image,
                input.link,
                input.position,
                input.sort_order,
                input.active,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("slider", id));
        }
        drop(conn);
        self.get_slider(id)
    }

    pub fn delete_slider(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM sliders WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found("slider", id));
        }
        Ok(())
    }

    pub fn list_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY priority DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], map_announcement)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn active_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
             WHERE active = 1 ORDER BY priority DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], map_announcement)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_announcement(&self, id: i64) -> Result<Announcement, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = ?1"),
            params![id],
            map_announcement,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("announcement", id))
    }

    pub fn create_announcement(
        &self,
        input: &AnnouncementInput,
    ) -> Result<Announcement, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO announcements
               (message, kind, background_color, text_color, icon, speed, priority, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                input.message,
                input.kind,
                input.background_color,
                input.text_color,
                input.icon,
                input.speed,
                input.priority,
                input.active,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_announcement(id)
    }

    pub fn update_announcement(
        &self,
        id: i64,
        input: &AnnouncementInput,
    ) -> Result<Announcement, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE announcements SET message = ?1, kind = ?2, background_color = ?3,
               text_color = ?4, icon = ?5, speed = ?6, priority = ?7, active = ?8
             WHERE id = ?9",
            params![
                input.message,
                input.kind,
                input.background_color,
                input.text_color,
                input.icon,
                input.speed,
                input.priority,
                input.active,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("announcement", id));
        }
        drop(conn);
        self.get_announcement(id)
    }

    pub fn delete_announcement(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM announcements WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found("announcement", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn slide(title: &str, position: &str, sort_order: i64, active: bool) -> SliderInput {
        SliderInput {
            title: title.to_string(),
            description: None,
            image: format!("/img/{title}.jpg"),
            link: None,
            position: position.to_string(),
            sort_order,
            active,
        }
    }

    #[test]
    fn active_sliders_honor_position_order_and_cap() {
        let store = Store::open_in_memory().expect("open");
        for i in 0..7 {
            store
                .create_slider(&slide(&format!("home-{i}"), "home", i, true))
                .expect("create");
        }
        store
            .create_slider(&slide("promo", "promo", 0, true))
            .expect("create");
        store
            .create_slider(&slide("hidden", "home", 0, false))
            .expect("create");

        let home = store.active_sliders("home").expect("active");
        assert_eq!(home.len(), ACTIVE_SLIDER_LIMIT);
        assert!(home.iter().all(|s| s.position == "home" && s.active));
        assert_eq!(home[0].sort_order, 0);
        assert_eq!(store.active_sliders("promo").expect("active").len(), 1);
        assert_eq!(store.list_sliders().expect("list").len(), 9);
    }

    #[test]
    fn slider_crud_round_trip() {
        let store = Store::open_in_memory().expect("open");
        let s = store
            .create_slider(&slide("welcome", "home", 1, true))
            .expect("create");
        let mut input = slide("welcome-updated", "home", 2, false);
        input.link = Some("https://petzone.example/sale".to_string());
        let updated = store.update_slider(s.id, &input).expect("update");
        assert_eq!(updated.title, "welcome-updated");
        assert!(!updated.active);

        store.delete_slider(s.id).expect("delete");
        assert!(matches!(
            store.get_slider(s.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn announcements_order_by_priority() {
        let store = Store::open_in_memory().expect("open");
        let low = AnnouncementInput {
            message: "Free shipping over 100".to_string(),
            kind: "info".to_string(),
            background_color: None,
            text_color: None,
            icon: None,
            speed: 50,
            priority: 1,
            active: true,
        };
        let mut high = low.clone();
        high.message = "Holiday closure".to_string();
        high.kind = "warning".to_string();
        high.priority = 9;
        let mut inactive = low.clone();
        inactive.message = "Old promo".to_string();
        inactive.active = false;

        store.create_announcement(&low).expect("create");
        store.create_announcement(&high).expect("create");
        store.create_announcement(&inactive).expect("create");

        let active = store.active_announcements().expect("active");
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].message, "Holiday closure");
        assert_eq!(store.list_announcements().expect("list").len(), 3);
    }
}
