use crate::{
    AppointmentCode, AppointmentStatus, Money, OrderCode, OrderStatus, PaymentMethod,
    ReservationCode, ReservationStatus,
};
use serde::{Deserialize, Serialize};

// Rows as served over the wire. Timestamps are UTC `YYYY-MM-DD HH:MM:SS`
// strings, the storage layer's native form.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub duration_minutes: i64,
    pub features: Vec<String>,
    pub image: Option<String>,
    pub available: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub stock: i64,
    pub subtotal: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    pub count: u32,
    pub total_items: u32,
    pub subtotal: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub code: OrderCode,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub code: ReservationCode,
    pub service_id: i64,
    pub service_name: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pet_name: String,
    pub pet_type: String,
    pub date: String,
    pub hour: String,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub total: Money,
    pub status: ReservationStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub code: AppointmentCode,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: Option<String>,
    pub status: AppointmentStatus,
    pub ip_address: Option<String>,
    pub requested_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slider {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub link: Option<String>,
    pub position: String,
    pub sort_order: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub message: String,
    pub kind: String,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub icon: Option<String>,
    pub speed: i64,
    pub priority: i64,
    pub active: bool,
}

/// Back-office account. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub last_login: Option<String>,
}

/// Storefront customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: String,
}
