use crate::ApiError;
use petzone_model::{
    CustomerName, Email, PaymentMethod, Phone, Quantity, SlotTime, ValidationError,
};
use serde::Deserialize;

fn field(name: &'static str, result: Result<impl Sized, ValidationError>) -> Result<(), ApiError> {
    result
        .map(|_| ())
        .map_err(|e| ApiError::validation_failed(name, &e.0))
}

fn opt_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddToCartRequest {
    pub product_id: i64,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl AddToCartRequest {
    pub fn validate(&self) -> Result<(i64, Quantity), ApiError> {
        if self.product_id <= 0 {
            return Err(ApiError::invalid_param(
                "product_id",
                &self.product_id.to_string(),
            ));
        }
        let quantity = Quantity::new(self.quantity.unwrap_or(1))
            .map_err(|e| ApiError::validation_failed("quantity", &e.0))?;
        Ok((self.product_id, quantity))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCartRequest {
    pub product_id: i64,
    /// Zero removes the line, matching the storefront contract.
    pub quantity: u32,
}

impl UpdateCartRequest {
    pub fn validate(&self) -> Result<(i64, Option<Quantity>), ApiError> {
        if self.product_id <= 0 {
            return Err(ApiError::invalid_param(
                "product_id",
                &self.product_id.to_string(),
            ));
        }
        if self.quantity == 0 {
            return Ok((self.product_id, None));
        }
        let quantity = Quantity::new(self.quantity)
            .map_err(|e| ApiError::validation_failed("quantity", &e.0))?;
        Ok((self.product_id, Some(quantity)))
    }
}

/// Validated checkout input handed to the store's order transaction.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub name: CustomerName,
    pub email: Email,
    pub phone: Phone,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<CheckoutDetails, ApiError> {
        let name = CustomerName::parse(&self.name)
            .map_err(|e| ApiError::validation_failed("name", &e.0))?;
        let email =
            Email::parse(&self.email).map_err(|e| ApiError::validation_failed("email", &e.0))?;
        let phone =
            Phone::parse(&self.phone).map_err(|e| ApiError::validation_failed("phone", &e.0))?;
        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(ApiError::validation_failed("address", "must not be empty"));
        }
        let payment_method = PaymentMethod::parse(&self.payment_method)
            .map_err(|e| ApiError::validation_failed("payment_method", &e.0))?;
        Ok(CheckoutDetails {
            name,
            email,
            phone,
            address,
            payment_method,
            notes: opt_text(self.notes.clone()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub service_id: i64,
    pub name: CustomerName,
    pub email: Email,
    pub phone: Phone,
    pub pet_name: String,
    pub pet_type: String,
    pub slot: SlotTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewReservationRequest {
    pub service_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pet_name: String,
    pub pet_type: String,
    pub date: String,
    pub hour: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewReservationRequest {
    pub fn validate(&self) -> Result<NewReservation, ApiError> {
        if self.service_id <= 0 {
            return Err(ApiError::invalid_param(
                "service_id",
                &self.service_id.to_string(),
            ));
        }
        let name = CustomerName::parse(&self.name)
            .map_err(|e| ApiError::validation_failed("name", &e.0))?;
        let email =
            Email::parse(&self.email).map_err(|e| ApiError::validation_failed("email", &e.0))?;
        let phone =
            Phone::parse(&self.phone).map_err(|e| ApiError::validation_failed("phone", &e.0))?;
        let pet_name = self.pet_name.trim().to_string();
        if pet_name.is_empty() {
            return Err(ApiError::validation_failed("pet_name", "must not be empty"));
        }
        let pet_type = self.pet_type.trim().to_string();
        if pet_type.is_empty() {
            return Err(ApiError::validation_failed("pet_type", "must not be empty"));
        }
        let slot = SlotTime::parse(&self.date, &self.hour)
            .map_err(|e| ApiError::validation_failed("slot", &e.0))?;
        Ok(NewReservation {
            service_id: self.service_id,
            name,
            email,
            phone,
            pet_name,
            pet_type,
            slot,
            notes: opt_text(self.notes.clone()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub name: CustomerName,
    pub email: Email,
    pub phone: Phone,
    pub service: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAppointmentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewAppointmentRequest {
    pub fn validate(&self) -> Result<NewAppointment, ApiError> {
        let name = CustomerName::parse(&self.name)
            .map_err(|e| ApiError::validation_failed("name", &e.0))?;
        let email =
            Email::parse(&self.email).map_err(|e| ApiError::validation_failed("email", &e.0))?;
        let phone =
            Phone::parse(&self.phone).map_err(|e| ApiError::validation_failed("phone", &e.0))?;
        let service = self.service.trim().to_string();
        if service.is_empty() {
            return Err(ApiError::validation_failed("service", "must not be empty"));
        }
        Ok(NewAppointment {
            name,
            email,
            phone,
            service,
            message: opt_text(self.message.clone()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAppointmentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String,
}

impl UpdateAppointmentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        field("name", CustomerName::parse(&self.name))?;
        field("email", Email::parse(&self.email))?;
        field("phone", Phone::parse(&self.phone))?;
        if self.service.trim().is_empty() {
            return Err(ApiError::validation_failed("service", "must not be empty"));
        }
        field(
            "status",
            petzone_model::AppointmentStatus::parse(&self.status),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpsertRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: i64,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl ProductUpsertRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation_failed("name", "must not be empty"));
        }
        if self.category_id <= 0 {
            return Err(ApiError::invalid_param(
                "category_id",
                &self.category_id.to_string(),
            ));
        }
        if self.price_cents < 0 {
            return Err(ApiError::validation_failed(
                "price_cents",
                "must not be negative",
            ));
        }
        if self.stock < 0 {
            return Err(ApiError::validation_failed("stock", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliderUpsertRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    pub position: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl SliderUpsertRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation_failed("title", "must not be empty"));
        }
        if self.image.trim().is_empty() {
            return Err(ApiError::validation_failed("image", "must not be empty"));
        }
        if self.position.trim().is_empty() {
            return Err(ApiError::validation_failed("position", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnouncementUpsertRequest {
    pub message: String,
    pub kind: String,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl AnnouncementUpsertRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::validation_failed("message", "must not be empty"));
        }
        if self.kind.trim().is_empty() {
            return Err(ApiError::validation_failed("kind", "must not be empty"));
        }
        if self.speed <= 0 {
            return Err(ApiError::validation_failed("speed", "must be positive"));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_speed() -> i64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(CustomerName, Email, Option<Phone>), ApiError> {
        let name = CustomerName::parse(&self.name)
            .map_err(|e| ApiError::validation_failed("name", &e.0))?;
        let email =
            Email::parse(&self.email).map_err(|e| ApiError::validation_failed("email", &e.0))?;
        let phone = match &self.phone {
            Some(raw) if !raw.trim().is_empty() => Some(
                Phone::parse(raw).map_err(|e| ApiError::validation_failed("phone", &e.0))?,
            ),
            _ => None,
        };
        if self.password.len() < 8 {
            return Err(ApiError::validation_failed(
                "password",
                "must be at least 8 characters",
            ));
        }
        Ok((name, email, phone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_cart_defaults_quantity_to_one() {
        let req: AddToCartRequest =
            serde_json::from_str(r#"{"product_id": 7}"#).expect("deserialize");
        let (id, qty) = req.validate().expect("validate");
        assert_eq!(id, 7);
        assert_eq!(qty.get(), 1);
    }

    #[test]
    fn update_cart_zero_means_remove() {
        let req = UpdateCartRequest {
            product_id: 7,
            quantity: 0,
        };
        let (_, qty) = req.validate().expect("validate");
        assert!(qty.is_none());
    }

    #[test]
    fn checkout_rejects_incomplete_contact() {
        let req = CheckoutRequest {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
            phone: "987654321".to_string(),
            address: "Av. Siempre Viva 123".to_string(),
            payment_method: "cash".to_string(),
            notes: None,
        };
        let err = req.validate().expect_err("bad email");
        assert_eq!(err.code, crate::ApiErrorCode::ValidationFailed);

        let ok = CheckoutRequest {
            email: "ana@petzone.example".to_string(),
            ..req
        }
        .validate()
        .expect("valid");
        assert_eq!(ok.payment_method, PaymentMethod::Cash);
        assert!(ok.notes.is_none());
    }

    #[test]
    fn reservation_requires_valid_slot() {
        let req = NewReservationRequest {
            service_id: 2,
            name: "Ana".to_string(),
            email: "ana@petzone.example".to_string(),
            phone: "987654321".to_string(),
            pet_name: "Rocky".to_string(),
            pet_type: "dog".to_string(),
            date: "2026-09-01".to_string(),
            hour: "21:00".to_string(),
            notes: Some("  ".to_string()),
        };
        assert!(req.validate().is_err());

        let ok = NewReservationRequest {
            hour: "10:00".to_string(),
            ..req
        }
        .validate()
        .expect("valid");
        assert_eq!(ok.slot.hour, 10);
        assert!(ok.notes.is_none());
    }

    #[test]
    fn register_enforces_password_length() {
        let req = RegisterRequest {
            name: "Ana".to_string(),
            email: "ana@petzone.example".to_string(),
            phone: None,
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<AddToCartRequest, _> =
            serde_json::from_str(r#"{"product_id": 1, "qty": 2}"#);
        assert!(result.is_err());
    }
}
