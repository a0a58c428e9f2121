use crate::{bad_column, now_string, today, Store, StoreError, CODE_RETRY_MAX};
use petzone_model::{
    Money, Order, OrderCode, OrderLine, OrderStatus, PaymentMethod, Quantity, SessionId,
};
use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::info;

/// Customer fields captured at checkout, pre-validated by the wire layer.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: usize,
    pub pages: usize,
}

struct CartLine {
    product_id: i64,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    stock: i64,
}

fn map_order_header(row: &Row<'_>) -> rusqlite::Result<Order> {
    let code: String = row.get(1)?;
    let payment: String = row.get(6)?;
    let status: String = row.get(10)?;
    let subtotal: i64 = row.get(8)?;
    let total: i64 = row.get(9)?;
    Ok(Order {
        id: row.get(0)?,
        code: OrderCode::parse(&code).map_err(|e| bad_column(1, e))?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        shipping_address: row.get(5)?,
        payment_method: PaymentMethod::parse(&payment).map_err(|e| bad_column(6, e))?,
        notes: row.get(7)?,
        subtotal: Money::from_cents(subtotal).map_err(|e| bad_column(8, e))?,
        total: Money::from_cents(total).map_err(|e| bad_column(9, e))?,
        status: OrderStatus::parse(&status).map_err(|e| bad_column(10, e))?,
        created_at: row.get(11)?,
        lines: Vec::new(),
    })
}

const ORDER_COLUMNS: &str = "id, code, customer_name, customer_email, customer_phone, \
     shipping_address, payment_method, notes, subtotal_cents, total_cents, status, created_at";

impl Store {
    /// Turns the session's cart into an order. Cart load, stock checks,
    /// order and line inserts, the stock decrement, and the cart delete all
    /// run in one transaction; any failure rolls everything back.
    pub fn checkout(
        &self,
        session: &SessionId,
        input: &CheckoutInput,
    ) -> Result<Order, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let lines = load_cart_lines(&tx, session)?;
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let mut subtotal = Money::ZERO;
        for line in &lines {
            if i64::from(line.quantity) > line.stock {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    requested: line.quantity,
                    available: line.stock,
                });
            }
            let qty = Quantity::new(line.quantity).map_err(StoreError::corrupt)?;
            let line_subtotal = line.unit_price.checked_mul(qty).map_err(StoreError::corrupt)?;
            subtotal = subtotal.checked_add(line_subtotal).map_err(StoreError::corrupt)?;
        }

        let code = insert_order_header(&tx, input, subtotal)?;
        let order_id = tx.last_insert_rowid();

        for line in &lines {
            let qty = Quantity::new(line.quantity).map_err(StoreError::corrupt)?;
            let line_subtotal = line.unit_price.checked_mul(qty).map_err(StoreError::corrupt)?;
            tx.execute(
                "INSERT INTO order_lines
                   (order_id, product_id, product_name, quantity, unit_price_cents,
                    subtotal_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    order_id,
                    line.product_id,
                    line.product_name,
                    line.quantity,
                    line.unit_price.cents(),
                    line_subtotal.cents(),
                ],
            )?;
            // Guarded decrement: zero affected rows means another checkout
            // took the stock since the read above.
            let changed = tx.execute(
                "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
                params![line.quantity, line.product_id],
            )?;
            if changed == 0 {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    requested: line.quantity,
                    available: line.stock,
                });
            }
        }

        tx.execute(
            "DELETE FROM cart_items WHERE session_id = ?1",
            params![session.as_str()],
        )?;
        tx.commit()?;
        drop(conn);

        info!(code = %code, lines = lines.len(), total_cents = subtotal.cents(), "order placed");
        self.get_order(&code)
    }

    pub fn get_order(&self, code: &OrderCode) -> Result<Order, StoreError> {
        let conn = self.conn()?;
        let mut order = conn
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE code = ?1"),
                params![code.as_str()],
                map_order_header,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("order", code.as_str()))?;
        let mut stmt = conn.prepare(
            "SELECT product_id, product_name, quantity, unit_price_cents, subtotal_cents
             FROM order_lines WHERE order_id = ?1 ORDER BY id",
        )?;
        order.lines = stmt
            .query_map(params![order.id], |row| {
                let qty: i64 = row.get(2)?;
                let unit: i64 = row.get(3)?;
                let sub: i64 = row.get(4)?;
                Ok(OrderLine {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    quantity: u32::try_from(qty).map_err(|_| {
                        bad_column(2, petzone_model::ValidationError("negative quantity".into()))
                    })?,
                    unit_price: Money::from_cents(unit).map_err(|e| bad_column(3, e))?,
                    subtotal: Money::from_cents(sub).map_err(|e| bad_column(4, e))?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(order)
    }

    pub fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: usize,
        limit: usize,
    ) -> Result<OrderPage, StoreError> {
        let conn = self.conn()?;
        let (filter_sql, status_text) = match status {
            Some(s) => (" WHERE status = ?1", Some(s.as_str())),
            None => ("", None),
        };
        let total: i64 = match status_text {
            Some(s) => conn.query_row(
                &format!("SELECT COUNT(*) FROM orders{filter_sql}"),
                params![s],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?,
        };
        let offset = (page.saturating_sub(1)) * limit;
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{filter_sql}
             ORDER BY created_at DESC, id DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = match status_text {
            Some(s) => stmt
                .query_map(params![s], map_order_header)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_order_header)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        let total = u64::try_from(total).unwrap_or(0);
        let pages = usize::try_from(total.div_ceil(limit.max(1) as u64)).unwrap_or(usize::MAX);
        Ok(OrderPage {
            orders,
            total,
            page,
            pages,
        })
    }

    pub fn set_order_status(
        &self,
        code: &OrderCode,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE orders SET status = ?1 WHERE code = ?2",
            params![status.as_str(), code.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("order", code.as_str()));
        }
        Ok(())
    }
}

fn load_cart_lines(tx: &Transaction<'_>, session: &SessionId) -> Result<Vec<CartLine>, StoreError> {
    let mut stmt = tx.prepare(
        "SELECT ci.product_id, p.name, ci.quantity, p.price_cents, p.stock
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.session_id = ?1
         ORDER BY ci.product_id",
    )?;
    let lines = stmt
        .query_map(params![session.as_str()], |row| {
            let qty: i64 = row.get(2)?;
            let cents: i64 = row.get(3)?;
            Ok(CartLine {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: u32::try_from(qty).map_err(|_| {
                    bad_column(2, petzone_model::ValidationError("negative quantity".into()))
                })?,
                unit_price: Money::from_cents(cents).map_err(|e| bad_column(3, e))?,
                stock: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Inserts the order header, regenerating the code on a UNIQUE collision.
fn insert_order_header(
    tx: &Transaction<'_>,
    input: &CheckoutInput,
    subtotal: Money,
) -> Result<OrderCode, StoreError> {
    let mut rng = rand::thread_rng();
    for _ in 0..CODE_RETRY_MAX {
        let code = OrderCode::generate(today(), &mut rng);
        let result = tx.execute(
            "INSERT INTO orders
               (code, customer_name, customer_email, customer_phone, shipping_address,
                payment_method, notes, subtotal_cents, total_cents, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10)",
            params![
                code.as_str(),
                input.customer_name,
                input.customer_email,
                input.customer_phone,
                input.shipping_address,
                input.payment_method.as_str(),
                input.notes,
                subtotal.cents(),
                subtotal.cents(),
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
        "could not allocate a unique order code".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductInput;
    use crate::Store;

    fn input() -> CheckoutInput {
        CheckoutInput {
            customer_name: "Ana Torres".to_string(),
            customer_email: "ana@petzone.example".to_string(),
            customer_phone: "987654321".to_string(),
            shipping_address: "Av. Central 42".to_string(),
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    fn seeded() -> (Store, SessionId, i64, i64) {
        let store = Store::open_in_memory().expect("open");
        let cat = store.create_category("Food", "food").expect("category");
        let a = store
            .create_product(&ProductInput {
                name: "Dog Food".to_string(),
                description: None,
                category_id: cat,
                price: Money::from_cents(2000).expect("money"),
                stock: 5,
                image: None,
                sku: None,
                featured: false,
            })
            .expect("product");
        let b = store
            .create_product(&ProductInput {
                name: "Cat Litter".to_string(),
                description: None,
                category_id: cat,
                price: Money::from_cents(1500).expect("money"),
                stock: 2,
                image: None,
                sku: None,
                featured: false,
            })
            .expect("product");
        let session = SessionId::parse("checkout-session").expect("session");
        (store, session, a.id, b.id)
    }

    #[test]
    fn checkout_creates_order_decrements_stock_and_clears_cart() {
        let (store, session, a, b) = seeded();
        store
            .add_to_cart(&session, a, Quantity::new(2).expect("qty"))
            .expect("add");
        store
            .add_to_cart(&session, b, Quantity::new(1).expect("qty"))
            .expect("add");

        let order = store.checkout(&session, &input()).expect("checkout");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal.cents(), 5500);
        assert_eq!(order.total.cents(), 5500);
        assert_eq!(order.lines.len(), 2);
        assert!(order.code.as_str().starts_with("PZ-"));

        assert_eq!(store.get_product(a).expect("product").stock, 3);
        assert_eq!(store.get_product(b).expect("product").stock, 1);
        assert_eq!(store.cart_count(&session).expect("count"), 0);

        let fetched = store.get_order(&order.code).expect("get");
        assert_eq!(fetched.lines.len(), 2);
        assert_eq!(fetched.customer_email, "ana@petzone.example");
    }

    #[test]
    fn empty_cart_is_rejected() {
        let (store, session, _, _) = seeded();
        assert!(matches!(
            store.checkout(&session, &input()),
            Err(StoreError::EmptyCart)
        ));
    }

    #[test]
    fn insufficient_stock_rolls_back_everything() {
        let (store, session, a, b) = seeded();
        store
            .add_to_cart(&session, a, Quantity::new(2).expect("qty"))
            .expect("add");
        store
            .add_to_cart(&session, b, Quantity::new(2).expect("qty"))
            .expect("add");
        // Deplete product b behind the cart's back.
        {
            let conn = store.conn().expect("lock");
            conn.execute("UPDATE products SET stock = 1 WHERE id = ?1", params![b])
                .expect("update");
        }

        let err = store.checkout(&session, &input()).expect_err("must fail");
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        // Nothing moved: stock untouched, cart intact, no order rows.
        assert_eq!(store.get_product(a).expect("product").stock, 5);
        assert_eq!(store.get_product(b).expect("product").stock, 1);
        assert_eq!(store.cart_count(&session).expect("count"), 4);
        let page = store.list_orders(None, 1, 10).expect("list");
        assert_eq!(page.total, 0);
    }

    #[test]
    fn order_listing_filters_by_status_and_pages() {
        let (store, session, a, _) = seeded();
        store
            .add_to_cart(&session, a, Quantity::ONE)
            .expect("add");
        let order = store.checkout(&session, &input()).expect("checkout");
        store
            .set_order_status(&order.code, OrderStatus::Shipped)
            .expect("status");

        let shipped = store
            .list_orders(Some(OrderStatus::Shipped), 1, 10)
            .expect("list");
        assert_eq!(shipped.total, 1);
        assert_eq!(shipped.orders[0].status, OrderStatus::Shipped);
        assert_eq!(shipped.pages, 1);

        let pending = store
            .list_orders(Some(OrderStatus::Pending), 1, 10)
            .expect("list");
        assert_eq!(pending.total, 0);
    }

    #[test]
    fn unknown_order_code_is_not_found() {
        let (store, _, _, _) = seeded();
        let code = OrderCode::parse("PZ-20260101-0001").expect("code");
        assert!(matches!(
            store.get_order(&code),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.set_order_status(&code, OrderStatus::Confirmed),
            Err(StoreError::NotFound { .. })
        ));
    }
}
