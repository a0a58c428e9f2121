use crate::{bad_column, now_string, Store, StoreError};
use petzone_model::{Category, Money, Product, Service};
use rusqlite::{params, OptionalExtension, Row};

/// Admin-side product payload; validation happens at the wire layer.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub price: Money,
    pub stock: i64,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub featured: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.category_id, c.name, c.slug, \
     p.price_cents, p.stock, p.image, p.sku, p.featured, p.active, p.created_at";

fn map_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    let cents: i64 = row.get(6)?;
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        category_slug: row.get(5)?,
        price: Money::from_cents(cents).map_err(|e| bad_column(6, e))?,
        stock: row.get(7)?,
        image: row.get(8)?,
        sku: row.get(9)?,
        featured: row.get(10)?,
        active: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn map_service(row: &Row<'_>) -> rusqlite::Result<Service> {
    let cents: i64 = row.get(4)?;
    let features_json: String = row.get(6)?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        price: Money::from_cents(cents).map_err(|e| bad_column(4, e))?,
        duration_minutes: row.get(5)?,
        features: serde_json::from_str(&features_json).map_err(|e| bad_column(6, e))?,
        image: row.get(7)?,
        available: row.get(8)?,
        sort_order: row.get(9)?,
    })
}

impl Store {
    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, description, icon, sort_order, active
             FROM categories WHERE active = 1 ORDER BY sort_order, name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                description: row.get(3)?,
                icon: row.get(4)?,
                sort_order: row.get(5)?,
                active: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn create_category(&self, name: &str, slug: &str) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("category slug already exists: {slug}"))
            }
            other => StoreError::Sqlite(other),
        })?;
        Ok(conn.last_insert_rowid())
    }

    /// Active products, featured first, with optional category and free-text
    /// filters.
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let conn = self.conn()?;
        let mut sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             JOIN categories c ON c.id = p.category_id
             WHERE p.active = 1"
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(category_id) = filter.category_id {
            args.push(Box::new(category_id));
            sql.push_str(&format!(" AND p.category_id = ?{}", args.len()));
        }
        if let Some(search) = &filter.search {
            args.push(Box::new(format!("%{search}%")));
            let idx = args.len();
            sql.push_str(&format!(
                " AND (p.name LIKE ?{idx} OR p.description LIKE ?{idx})"
            ));
        }
        sql.push_str(" ORDER BY p.featured DESC, p.name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), map_product)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_product(&self, id: i64) -> Result<Product, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products p
                 JOIN categories c ON c.id = p.category_id WHERE p.id = ?1"
            ),
            params![id],
            map_product,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("product", id))
    }

    pub fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO products
               (name, description, category_id, price_cents, stock, image, sku, featured,
                active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
            params![
                input.name,
                input.description,
                input.category_id,
                input.price.cents(),
                input.stock,
                input.image,
                input.sku,
                input.featured,
                now_string(),
            ],
        )
        .map_err(map_category_fk)?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_product(id)
    }

    pub fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, StoreError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE products SET name = ?1, description = ?2, category_id = ?3,
                   price_cents = ?4, stock = ?5, image = ?6, sku = ?7, featured = ?8
                 WHERE id = ?9",
                params![
                    input.name,
                    input.description,
                    input.category_id,
                    input.price.cents(),
                    input.stock,
                    input.image,
                    input.sku,
                    input.featured,
                    id,
                ],
            )
            .map_err(map_category_fk)?;
        if changed == 0 {
            return Err(StoreError::not_found("product", id));
        }
        drop(conn);
        self.get_product(id)
    }

    /// Removes the product and any cart lines pointing at it. Order lines
    /// keep their denormalized snapshot.
    pub fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cart_items WHERE product_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::not_found("product", id));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, description, price_cents, duration_minutes, features,
                    image, available, sort_order
             FROM services WHERE available = 1 ORDER BY sort_order, name",
        )?;
        let rows = stmt.query_map([], map_service)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_service(&self, id: i64) -> Result<Service, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, slug, description, price_cents, duration_minutes, features,
                    image, available, sort_order
             FROM services WHERE id = ?1",
            params![id],
            map_service,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("service", id))
    }

    pub fn get_service_by_slug(&self, slug: &str) -> Result<Service, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, slug, description, price_cents, duration_minutes, features,
                    image, available, sort_order
             FROM services WHERE slug = ?1",
            params![slug],
            map_service,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("service", slug))
    }

    pub fn create_service(
        &self,
        name: &str,
        slug: &str,
        price: Money,
        duration_minutes: i64,
        features: &[String],
    ) -> Result<Service, StoreError> {
        let features_json = serde_json::to_string(features).map_err(StoreError::corrupt)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO services (name, slug, description, price_cents, duration_minutes,
                                   features)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
            params![name, slug, price.cents(), duration_minutes, features_json],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("service slug already exists: {slug}"))
            }
            other => StoreError::Sqlite(other),
        })?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_service(id)
    }
}

fn map_category_fk(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::not_found("category", "referenced by product")
        }
        other => StoreError::Sqlite(other),
    }
}
