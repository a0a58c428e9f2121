#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub mod dto;
pub mod params;

pub const CRATE_NAME: &str = "petzone-api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidParameter,
    MissingParameter,
    ValidationFailed,
    NotFound,
    Unauthorized,
    Conflict,
    InsufficientStock,
    EmptyCart,
    SlotUnavailable,
    RateLimited,
    Internal,
}

impl ApiErrorCode {
    /// HTTP status the server layer maps this code onto.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidParameter | Self::MissingParameter | Self::EmptyCart => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::ValidationFailed | Self::InsufficientStock | Self::SlotUnavailable => 422,
            Self::RateLimited => 429,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidParameter,
            format!("invalid parameter: {name}"),
            json!({"parameter": name, "value": value}),
        )
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ApiErrorCode::MissingParameter,
            format!("missing parameter: {name}"),
            json!({"parameter": name}),
        )
    }

    #[must_use]
    pub fn validation_failed(field: &str, reason: &str) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": [{"field": field, "reason": reason}]}),
        )
    }

    #[must_use]
    pub fn not_found(kind: &str, key: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{kind} not found"),
            json!({"kind": kind, "key": key}),
        )
    }

    #[must_use]
    pub fn unauthorized(message: &str) -> Self {
        Self::new(ApiErrorCode::Unauthorized, message, json!({}))
    }

    #[must_use]
    pub fn internal(message: &str) -> Self {
        Self::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({"message": message}),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_details_schema_stable() {
        let e = ApiError::invalid_param("limit", "nope");
        assert_eq!(e.code, ApiErrorCode::InvalidParameter);
        assert!(e.details.get("parameter").is_some());
        assert!(e.details.get("value").is_some());

        let e = ApiError::validation_failed("email", "must contain @");
        assert!(e.details.get("field_errors").is_some());
    }

    #[test]
    fn status_mapping_covers_all_codes() {
        assert_eq!(ApiErrorCode::EmptyCart.http_status(), 400);
        assert_eq!(ApiErrorCode::Unauthorized.http_status(), 401);
        assert_eq!(ApiErrorCode::NotFound.http_status(), 404);
        assert_eq!(ApiErrorCode::Conflict.http_status(), 409);
        assert_eq!(ApiErrorCode::InsufficientStock.http_status(), 422);
        assert_eq!(ApiErrorCode::SlotUnavailable.http_status(), 422);
        assert_eq!(ApiErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn error_serializes_with_code_text() {
        let e = ApiError::not_found("product", "41");
        let v = serde_json::to_value(&e).expect("serialize");
        assert_eq!(v["code"], "NotFound");
        assert_eq!(v["details"]["key"], "41");
    }
}
