use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use petzone_api::{ApiError, ApiErrorCode};
use petzone_store::StoreError;
use serde_json::json;
use tracing::error;

#[must_use]
pub(crate) fn api_error_status(code: ApiErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[must_use]
pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status = api_error_status(err.code);
    let body = Json(json!({"error": err}));
    let mut resp = (status, body).into_response();
    if status == StatusCode::TOO_MANY_REQUESTS {
        resp.headers_mut()
            .insert("retry-after", axum::http::HeaderValue::from_static("3"));
    }
    resp
}

/// Storage failures fold into the wire error vocabulary. Database and
/// corruption errors are logged here and surface as opaque internals.
pub(crate) fn store_error_to_api(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { kind, key } => ApiError::not_found(kind, &key),
        StoreError::InsufficientStock {
            product_id,
            product_name,
            requested,
            available,
        } => ApiError::new(
            ApiErrorCode::InsufficientStock,
            format!("insufficient stock for {product_name}"),
            json!({
                "product_id": product_id,
                "product": product_name,
                "requested": requested,
                "available": available,
            }),
        ),
        StoreError::EmptyCart => ApiError::new(
            ApiErrorCode::EmptyCart,
            "cart is empty",
            json!({}),
        ),
        StoreError::SlotUnavailable { service_id, slot } => ApiError::new(
            ApiErrorCode::SlotUnavailable,
            "slot is fully booked",
            json!({"service_id": service_id, "slot": slot}),
        ),
        StoreError::Conflict(message) => {
            ApiError::new(ApiErrorCode::Conflict, message, json!({}))
        }
        StoreError::Sqlite(e) => {
            error!(err = %e, "storage failure");
            ApiError::internal("storage failure")
        }
        StoreError::Corrupt(message) => {
            error!(%message, "stored data failed validation");
            ApiError::internal("storage failure")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_wire_codes() {
        let e = store_error_to_api(StoreError::EmptyCart);
        assert_eq!(e.code, ApiErrorCode::EmptyCart);

        let e = store_error_to_api(StoreError::InsufficientStock {
            product_id: 4,
            product_name: "Dog Food".to_string(),
            requested: 5,
            available: 2,
        });
        assert_eq!(e.code, ApiErrorCode::InsufficientStock);
        assert_eq!(e.details["available"], 2);

        let e = store_error_to_api(StoreError::Conflict("dup".to_string()));
        assert_eq!(e.code, ApiErrorCode::Conflict);

        let e = store_error_to_api(StoreError::Corrupt("bad row".to_string()));
        assert_eq!(e.code, ApiErrorCode::Internal);
        assert!(!e.message.contains("bad row"), "internals stay opaque");
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let resp = api_error_response(ApiError::new(
            ApiErrorCode::RateLimited,
            "slow down",
            json!({}),
        ));
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("retry-after"));
    }
}
