use crate::session::Identity;
use crate::AppState;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use petzone_api::ApiError;
use petzone_model::SessionId;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub(crate) mod appointments;
pub(crate) mod auth;
pub(crate) mod cart;
pub(crate) mod catalog;
pub(crate) mod content;
pub(crate) mod health;
pub(crate) mod orders;
pub(crate) mod reservations;
pub(crate) mod stats;

pub(crate) type QueryMap = BTreeMap<String, String>;

pub(crate) const CART_SESSION_HEADER: &str = "x-cart-session";

pub(crate) fn json_ok(value: Value) -> Response {
    Json(value).into_response()
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the bearer token to an admin identity or fails with 401.
pub(crate) fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(i64, String), ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    match state.sessions.resolve(token) {
        Some(Identity::Admin { id, username, .. }) => Ok((id, username)),
        _ => Err(ApiError::unauthorized("admin session required")),
    }
}

pub(crate) fn require_customer(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<i64, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    match state.sessions.resolve(token) {
        Some(Identity::Customer { id, .. }) => Ok(id),
        _ => Err(ApiError::unauthorized("account session required")),
    }
}

/// Cart identity from the `x-cart-session` header; a missing header mints a
/// fresh session. The flag marks minted sessions so the handler can echo the
/// id back.
pub(crate) fn cart_session(headers: &HeaderMap) -> Result<(SessionId, bool), ApiError> {
    match headers.get(CART_SESSION_HEADER) {
        Some(raw) => {
            let raw = raw
                .to_str()
                .map_err(|_| ApiError::invalid_param(CART_SESSION_HEADER, "<non-ascii>"))?;
            let session = SessionId::parse(raw)
                .map_err(|e| ApiError::validation_failed(CART_SESSION_HEADER, &e.0))?;
            Ok((session, false))
        }
        None => {
            let minted = SessionId::parse(&format!("cart-{}", Uuid::new_v4().simple()))
                .map_err(|e| ApiError::internal(&e.0))?;
            Ok((minted, true))
        }
    }
}

/// Attaches the cart session header so clients learn a freshly minted id.
pub(crate) fn with_cart_header(mut response: Response, session: &SessionId) -> Response {
    if let Ok(value) = HeaderValue::from_str(session.as_str()) {
        response.headers_mut().insert(CART_SESSION_HEADER, value);
    }
    response
}

pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert!(bearer_token(&headers).is_none());
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer "),
        );
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn cart_session_mints_when_absent() {
        let headers = HeaderMap::new();
        let (session, minted) = cart_session(&headers).expect("mint");
        assert!(minted);
        assert!(session.as_str().starts_with("cart-"));

        let mut headers = HeaderMap::new();
        headers.insert(
            CART_SESSION_HEADER,
            HeaderValue::from_str(session.as_str()).expect("value"),
        );
        let (echoed, minted) = cart_session(&headers).expect("echo");
        assert!(!minted);
        assert_eq!(echoed, session);
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
    }
}
