use super::{client_ip, json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::StatusChangeRequest;
use petzone_api::{params, ApiError};
use petzone_model::{OrderCode, OrderStatus};
use serde_json::json;

pub(crate) async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QueryMap>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let parsed = match params::parse_order_list(&query) {
        Ok(p) => p,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| {
            store.list_orders(parsed.status, parsed.pagination.page, parsed.pagination.limit)
        })
        .await
    {
        Ok(page) => json_ok(json!({
            "orders": page.orders,
            "total": page.total,
            "page": page.page,
            "pages": page.pages,
        })),
        Err(err) => api_error_response(err),
    }
}

/// Order confirmation lookup; the code itself is the capability.
pub(crate) async fn get_order(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let code = match OrderCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return api_error_response(ApiError::validation_failed("code", &e.0)),
    };
    match state.run_store(move |store| store.get_order(&code)).await {
        Ok(order) => json_ok(json!({"order": order})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn set_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    axum::Json(req): axum::Json<StatusChangeRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    let code = match OrderCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return api_error_response(ApiError::validation_failed("code", &e.0)),
    };
    let status = match OrderStatus::parse(&req.status) {
        Ok(status) => status,
        Err(e) => return api_error_response(ApiError::validation_failed("status", &e.0)),
    };
    let update_code = code.clone();
    match state
        .run_store(move |store| {
            store.set_order_status(&update_code, status)?;
            store.get_order(&update_code)
        })
        .await
    {
        Ok(order) => {
            state.record_activity(
                admin_id,
                username,
                "orders",
                "status",
                format!("code={} status={}", code, status),
                client_ip(&headers),
            );
            json_ok(json!({"order": order}))
        }
        Err(err) => api_error_response(err),
    }
}
