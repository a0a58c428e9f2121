use crate::{bad_column, now_string, Store, StoreError};
use petzone_model::{CartItem, CartTotals, Money, Quantity, SessionId};
use rusqlite::{params, OptionalExtension, Row};

fn map_cart_item(row: &Row<'_>) -> rusqlite::Result<CartItem> {
    let quantity: i64 = row.get(3)?;
    let cents: i64 = row.get(4)?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| bad_column(3, petzone_model::ValidationError("negative quantity".into())))?;
    let unit_price = Money::from_cents(cents).map_err(|e| bad_column(4, e))?;
    let qty = Quantity::new(quantity).map_err(|e| bad_column(3, e))?;
    let subtotal = unit_price.checked_mul(qty).map_err(|e| bad_column(4, e))?;
    Ok(CartItem {
        product_id: row.get(0)?,
        name: row.get(1)?,
        image: row.get(2)?,
        quantity,
        unit_price,
        stock: row.get(5)?,
        subtotal,
    })
}

impl Store {
    /// Cart lines joined with live product data, plus derived totals.
    pub fn fetch_cart(
        &self,
        session: &SessionId,
    ) -> Result<(Vec<CartItem>, CartTotals), StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT ci.product_id, p.name, p.image, ci.quantity, p.price_cents, p.stock
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.session_id = ?1
             ORDER BY ci.added_at, ci.product_id",
        )?;
        let items = stmt
            .query_map(params![session.as_str()], map_cart_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);
        let totals = totals_of(&items)?;
        Ok((items, totals))
    }

    /// Upserts a line at the product's current price. The requested quantity
    /// is added to any existing line; the combined amount must fit the stock.
    pub fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: Quantity,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let product: Option<(String, i64, bool)> = tx
            .query_row(
                "SELECT name, stock, active FROM products WHERE id = ?1",
                params![product_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (name, stock, active) =
            product.ok_or_else(|| StoreError::not_found("product", product_id))?;
        if !active {
            return Err(StoreError::not_found("product", product_id));
        }
        let existing: i64 = tx
            .query_row(
                "SELECT quantity FROM cart_items WHERE session_id = ?1 AND product_id = ?2",
                params![session.as_str(), product_id],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);
        let requested = existing + i64::from(quantity.get());
        if requested > stock {
            return Err(StoreError::InsufficientStock {
                product_id,
                product_name: name,
                requested: u32::try_from(requested).unwrap_or(u32::MAX),
                available: stock,
            });
        }
        tx.execute(
            "INSERT INTO cart_items (session_id, product_id, quantity, added_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, product_id)
             DO UPDATE SET quantity = quantity + excluded.quantity",
            params![session.as_str(), product_id, quantity.get(), now_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Sets the line to an absolute quantity; `None` removes it.
    pub fn update_cart_item(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: Option<Quantity>,
    ) -> Result<(), StoreError> {
        let Some(quantity) = quantity else {
            return self.remove_cart_item(session, product_id);
        };
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let product: Option<(String, i64)> = tx
            .query_row(
                "SELECT name, stock FROM products WHERE id = ?1 AND active = 1",
                params![product_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (name, stock) = product.ok_or_else(|| StoreError::not_found("product", product_id))?;
        if i64::from(quantity.get()) > stock {
            return Err(StoreError::InsufficientStock {
                product_id,
                product_name: name,
                requested: quantity.get(),
                available: stock,
            });
        }
        let changed = tx.execute(
            "UPDATE cart_items SET quantity = ?1 WHERE session_id = ?2 AND product_id = ?3",
            params![quantity.get(), session.as_str(), product_id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("cart line", product_id));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn remove_cart_item(
        &self,
        session: &SessionId,
        product_id: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM cart_items WHERE session_id = ?1 AND product_id = ?2",
            params![session.as_str(), product_id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("cart line", product_id));
        }
        Ok(())
    }

    pub fn clear_cart(&self, session: &SessionId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM cart_items WHERE session_id = ?1",
            params![session.as_str()],
        )?;
        Ok(())
    }

    /// Total item count without loading the full cart, for badge displays.
    pub fn cart_count(&self, session: &SessionId) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE session_id = ?1",
            params![session.as_str()],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count).unwrap_or(0))
    }
}

fn totals_of(items: &[CartItem]) -> Result<CartTotals, StoreError> {
    let mut subtotal = Money::ZERO;
    let mut total_items: u32 = 0;
    for item in items {
        subtotal = subtotal
            .checked_add(item.subtotal)
            .map_err(StoreError::corrupt)?;
        total_items = total_items.saturating_add(item.quantity);
    }
    Ok(CartTotals {
        count: u32::try_from(items.len()).unwrap_or(u32::MAX),
        total_items,
        subtotal,
        total: subtotal,
    })
}
