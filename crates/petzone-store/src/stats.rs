use crate::{bad_column, today, Store, StoreError};
use petzone_model::Money;
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub active_products: i64,
    pub low_stock_products: i64,
    pub active_sliders: i64,
    pub active_announcements: i64,
    pub orders_today: i64,
    pub pending_orders: i64,
    pub total_sales: Money,
    pub month_sales: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub products: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceLoad {
    pub service: String,
    pub reservations: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub orders: i64,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub units: i64,
    pub revenue: Money,
}

// Cancelled orders are excluded from every sales figure.
const SALES_FILTER: &str = "status != 'cancelled'";

impl Store {
    pub fn dashboard_stats(&self, low_stock_threshold: i64) -> Result<DashboardStats, StoreError> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<i64, StoreError> {
            Ok(conn.query_row(sql, [], |row| row.get(0))?)
        };
        let active_products = count("SELECT COUNT(*) FROM products WHERE active = 1")?;
        let low_stock_products: i64 = conn.query_row(
            "SELECT COUNT(*) FROM products WHERE active = 1 AND stock < ?1",
            params![low_stock_threshold],
            |row| row.get(0),
        )?;
        let active_sliders = count("SELECT COUNT(*) FROM sliders WHERE active = 1")?;
        let active_announcements = count("SELECT COUNT(*) FROM announcements WHERE active = 1")?;

        let today_str = today().format("%Y-%m-%d").to_string();
        let orders_today: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE substr(created_at, 1, 10) = ?1",
            params![today_str],
            |row| row.get(0),
        )?;
        let pending_orders = count("SELECT COUNT(*) FROM orders WHERE status = 'pending'")?;

        let total_cents: i64 = conn.query_row(
            &format!("SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE {SALES_FILTER}"),
            [],
            |row| row.get(0),
        )?;
        let month_prefix = today().format("%Y-%m").to_string();
        let month_cents: i64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(total_cents), 0) FROM orders
                 WHERE {SALES_FILTER} AND substr(created_at, 1, 7) = ?1"
            ),
            params![month_prefix],
            |row| row.get(0),
        )?;

        Ok(DashboardStats {
            active_products,
            low_stock_products,
            active_sliders,
            active_announcements,
            orders_today,
            pending_orders,
            total_sales: Money::from_cents(total_cents).map_err(StoreError::corrupt)?,
            month_sales: Money::from_cents(month_cents).map_err(StoreError::corrupt)?,
        })
    }

    pub fn products_by_category(&self) -> Result<Vec<CategorySales>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.name, COUNT(p.id) FROM categories c
             LEFT JOIN products p ON p.category_id = c.id AND p.active = 1
             WHERE c.active = 1
             GROUP BY c.id ORDER BY c.sort_order, c.name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategorySales {
                category: row.get(0)?,
                products: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Non-cancelled bookings per service over the trailing `days` window.
    pub fn reservations_by_service(&self, days: u32) -> Result<Vec<ServiceLoad>, StoreError> {
        let since = (today() - chrono::Days::new(u64::from(days)))
            .format("%Y-%m-%d")
            .to_string();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT s.name, COUNT(r.id) AS n FROM services s
             LEFT JOIN reservations r
               ON r.service_id = s.id AND r.status != 'cancelled' AND r.date >= ?1
             GROUP BY s.id ORDER BY n DESC, s.name",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok(ServiceLoad {
                service: row.get(0)?,
                reservations: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Sales per calendar month over the trailing `months` window, oldest
    /// first.
    pub fn monthly_sales(&self, months: u32) -> Result<Vec<MonthlySales>, StoreError> {
        let start = today()
            .checked_sub_months(chrono::Months::new(months.saturating_sub(1)))
            .unwrap_or(today());
        let since = start.format("%Y-%m").to_string();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT substr(created_at, 1, 7) AS month, COUNT(*), COALESCE(SUM(total_cents), 0)
             FROM orders WHERE {SALES_FILTER} AND substr(created_at, 1, 7) >= ?1
             GROUP BY month ORDER BY month"
        ))?;
        let rows = stmt.query_map(params![since], |row| {
            let cents: i64 = row.get(2)?;
            Ok(MonthlySales {
                month: row.get(0)?,
                orders: row.get(1)?,
                total: Money::from_cents(cents).map_err(|e| bad_column(2, e))?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn top_products(&self, limit: usize) -> Result<Vec<TopProduct>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT ol.product_id, ol.product_name, SUM(ol.quantity) AS units,
                    COALESCE(SUM(ol.subtotal_cents), 0)
             FROM order_lines ol
             JOIN orders o ON o.id = ol.order_id AND o.{SALES_FILTER}
             GROUP BY ol.product_id, ol.product_name
             ORDER BY units DESC, ol.product_name LIMIT {}",
            limit.max(1)
        ))?;
        let rows = stmt.query_map([], |row| {
            let cents: i64 = row.get(3)?;
            Ok(TopProduct {
                product_id: row.get(0)?,
                name: row.get(1)?,
                units: row.get(2)?,
                revenue: Money::from_cents(cents).map_err(|e| bad_column(3, e))?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductInput;
    use crate::checkout::CheckoutInput;
    use crate::Store;
    use petzone_model::{PaymentMethod, Quantity, SessionId};

    fn seeded_with_order() -> Store {
        let store = Store::open_in_memory().expect("open");
        let cat = store.create_category("Food", "food").expect("category");
        let a = store
            .create_product(&ProductInput {
                name: "Dog Food".to_string(),
                description: None,
                category_id: cat,
                price: Money::from_cents(2000).expect("money"),
                stock: 50,
                image: None,
                sku: None,
                featured: false,
            })
            .expect("product");
        store
            .create_product(&ProductInput {
                name: "Nearly Gone".to_string(),
                description: None,
                category_id: cat,
                price: Money::from_cents(500).expect("money"),
                stock: 2,
                image: None,
                sku: None,
                featured: false,
            })
            .expect("product");
        let session = SessionId::parse("stats-session").expect("session");
        store
            .add_to_cart(&session, a.id, Quantity::new(3).expect("qty"))
            .expect("add");
        store
            .checkout(
                &session,
                &CheckoutInput {
                    customer_name: "Ana".to_string(),
                    customer_email: "ana@petzone.example".to_string(),
                    customer_phone: "987654321".to_string(),
                    shipping_address: "Av. Central 42".to_string(),
                    payment_method: PaymentMethod::Card,
                    notes: None,
                },
            )
            .expect("checkout");
        store
    }

    #[test]
    fn dashboard_reflects_orders_and_stock() {
        let store = seeded_with_order();
        let stats = store.dashboard_stats(10).expect("stats");
        assert_eq!(stats.active_products, 2);
        assert_eq!(stats.low_stock_products, 1);
        assert_eq!(stats.orders_today, 1);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.total_sales.cents(), 6000);
        assert_eq!(stats.month_sales.cents(), 6000);
    }

    #[test]
    fn cancelled_orders_drop_out_of_sales() {
        let store = seeded_with_order();
        let page = store.list_orders(None, 1, 10).expect("list");
        let code = page.orders[0].code.clone();
        store
            .set_order_status(&code, petzone_model::OrderStatus::Cancelled)
            .expect("cancel");
        let stats = store.dashboard_stats(10).expect("stats");
        assert_eq!(stats.total_sales.cents(), 0);
        assert!(store.top_products(5).expect("top").is_empty());
        assert!(store.monthly_sales(3).expect("monthly").is_empty());
    }

    #[test]
    fn breakdowns_group_and_rank() {
        let store = seeded_with_order();
        let by_category = store.products_by_category().expect("by category");
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].products, 2);

        let monthly = store.monthly_sales(6).expect("monthly");
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].orders, 1);
        assert_eq!(monthly[0].total.cents(), 6000);

        let top = store.top_products(5).expect("top");
        assert_eq!(top[0].name, "Dog Food");
        assert_eq!(top[0].units, 3);
        assert_eq!(top[0].revenue.cents(), 6000);
    }

    #[test]
    fn service_load_counts_recent_bookings() {
        let store = seeded_with_order();
        let service = store
            .create_service(
                "Grooming",
                "grooming",
                Money::from_cents(3500).expect("money"),
                45,
                &[],
            )
            .expect("service");
        let slot_date = (crate::today() + chrono::Days::new(1))
            .format("%Y-%m-%d")
            .to_string();
        store
            .create_reservation(&crate::reservations::ReservationInput {
                service_id: service.id,
                customer_name: "Ana".to_string(),
                customer_email: "ana@petzone.example".to_string(),
                customer_phone: "987654321".to_string(),
                pet_name: "Rocky".to_string(),
                pet_type: "dog".to_string(),
                slot: petzone_model::SlotTime::parse(&slot_date, "10:00").expect("slot"),
                notes: None,
            })
            .expect("book");

        let load = store.reservations_by_service(30).expect("load");
        assert_eq!(load[0].service, "Grooming");
        assert_eq!(load[0].reservations, 1);
    }
}
