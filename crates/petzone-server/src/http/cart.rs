use super::{cart_session, json_ok, with_cart_header};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::{AddToCartRequest, CheckoutRequest, UpdateCartRequest};
use petzone_store::CheckoutInput;
use serde_json::json;

pub(crate) async fn get_cart(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let lookup = session.clone();
    let response = match state.run_store(move |store| store.fetch_cart(&lookup)).await {
        Ok((items, totals)) => json_ok(json!({"items": items, "totals": totals})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<AddToCartRequest>,
) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let (product_id, quantity) = match req.validate() {
        Ok(v) => v,
        Err(err) => return api_error_response(err),
    };
    let mutate = session.clone();
    let response = match state
        .run_store(move |store| {
            store.add_to_cart(&mutate, product_id, quantity)?;
            store.cart_count(&mutate)
        })
        .await
    {
        Ok(count) => json_ok(json!({"added": product_id, "count": count})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<UpdateCartRequest>,
) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let (product_id, quantity) = match req.validate() {
        Ok(v) => v,
        Err(err) => return api_error_response(err),
    };
    let mutate = session.clone();
    let response = match state
        .run_store(move |store| {
            store.update_cart_item(&mutate, product_id, quantity)?;
            store.fetch_cart(&mutate)
        })
        .await
    {
        Ok((items, totals)) => json_ok(json!({"items": items, "totals": totals})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let mutate = session.clone();
    let response = match state
        .run_store(move |store| store.remove_cart_item(&mutate, product_id))
        .await
    {
        Ok(()) => json_ok(json!({"removed": product_id})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn clear_cart(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let mutate = session.clone();
    let response = match state.run_store(move |store| store.clear_cart(&mutate)).await {
        Ok(()) => json_ok(json!({"cleared": true})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn cart_count(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let lookup = session.clone();
    let response = match state.run_store(move |store| store.cart_count(&lookup)).await {
        Ok(count) => json_ok(json!({"count": count})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}

pub(crate) async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<CheckoutRequest>,
) -> Response {
    let (session, _) = match cart_session(&headers) {
        Ok(s) => s,
        Err(err) => return api_error_response(err),
    };
    let details = match req.validate() {
        Ok(d) => d,
        Err(err) => return api_error_response(err),
    };
    let input = CheckoutInput {
        customer_name: details.name.as_str().to_string(),
        customer_email: details.email.as_str().to_string(),
        customer_phone: details.phone.as_str().to_string(),
        shipping_address: details.address,
        payment_method: details.payment_method,
        notes: details.notes,
    };
    let mutate = session.clone();
    let response = match state
        .run_store(move |store| store.checkout(&mutate, &input))
        .await
    {
        Ok(order) => json_ok(json!({"order": order})),
        Err(err) => api_error_response(err),
    };
    with_cart_header(response, &session)
}
