#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

mod codes;
mod contact;
mod entities;
mod money;
mod slot;
mod status;

pub use codes::{AppointmentCode, OrderCode, ReservationCode, SessionId};
pub use contact::{CustomerName, Email, Phone, Slug};
pub use entities::{
    AdminUser, Announcement, Appointment, CartItem, CartTotals, Category, Order, OrderLine,
    Product, Reservation, Service, Slider, WebUser,
};
pub use money::{Money, Quantity};
pub use slot::{SlotTime, SLOT_HOUR_MAX, SLOT_HOUR_MIN};
pub use status::{AppointmentStatus, OrderStatus, PaymentMethod, ReservationStatus};

pub const CRATE_NAME: &str = "petzone-model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
