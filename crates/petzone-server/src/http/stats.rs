use super::{json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::params;
use serde_json::json;

pub(crate) async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let threshold = state.config.low_stock_threshold;
    match state
        .run_store(move |store| store.dashboard_stats(threshold))
        .await
    {
        Ok(stats) => json_ok(json!({"stats": stats})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn monthly_sales(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QueryMap>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let months = match params::parse_window(&query, "months", 6, 36) {
        Ok(m) => m,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.monthly_sales(months)).await {
        Ok(sales) => json_ok(json!({"monthly": sales})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn top_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QueryMap>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let limit = match params::parse_window(&query, "limit", 10, 50) {
        Ok(l) => l as usize,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.top_products(limit)).await {
        Ok(products) => json_ok(json!({"products": products})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn products_by_category(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(|store| store.products_by_category()).await {
        Ok(categories) => json_ok(json!({"categories": categories})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn reservations_by_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QueryMap>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let days = match params::parse_window(&query, "days", 30, 365) {
        Ok(d) => d,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.reservations_by_service(days))
        .await
    {
        Ok(services) => json_ok(json!({"services": services})),
        Err(err) => api_error_response(err),
    }
}
