use super::{client_ip, json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::{CancelRequest, NewReservationRequest, StatusChangeRequest};
use petzone_api::{params, ApiError};
use petzone_model::{ReservationCode, ReservationStatus};
use petzone_store::ReservationInput;
use serde_json::json;

pub(crate) async fn create(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<NewReservationRequest>,
) -> Response {
    let booking = match req.validate() {
        Ok(b) => b,
        Err(err) => return api_error_response(err),
    };
    let input = ReservationInput {
        service_id: booking.service_id,
        customer_name: booking.name.as_str().to_string(),
        customer_email: booking.email.as_str().to_string(),
        customer_phone: booking.phone.as_str().to_string(),
        pet_name: booking.pet_name,
        pet_type: booking.pet_type,
        slot: booking.slot,
        notes: booking.notes,
    };
    match state
        .run_store(move |store| store.create_reservation(&input))
        .await
    {
        Ok(reservation) => json_ok(json!({"reservation": reservation})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn availability(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Response {
    let parsed = match params::parse_availability(&query) {
        Ok(p) => p,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.slot_availability(parsed.service_id, &parsed.slot))
        .await
    {
        Ok(slot) => json_ok(json!({
            "available": slot.available,
            "current": slot.current,
            "capacity": slot.capacity,
        })),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list_recent(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state
        .run_store(|store| store.list_recent_reservations())
        .await
    {
        Ok(reservations) => json_ok(json!({"reservations": reservations})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    let code = match ReservationCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return api_error_response(ApiError::validation_failed("code", &e.0)),
    };
    match state
        .run_store(move |store| store.get_reservation(&code))
        .await
    {
        Ok(reservation) => json_ok(json!({"reservation": reservation})),
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
    let code = match ReservationCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return api_error_response(ApiError::validation_failed("code", &e.0)),
    };
    let status = match ReservationStatus::parse(&req.status) {
        Ok(status) => status,
        Err(e) => return api_error_response(ApiError::validation_failed("status", &e.0)),
    };
    let update_code = code.clone();
    match state
        .run_store(move |store| {
            store.set_reservation_status(&update_code, status)?;
            store.get_reservation(&update_code)
        })
        .await
    {
        Ok(reservation) => {
            state.record_activity(
                admin_id,
                username,
                "reservations",
                "status",
                format!("code={} status={}", code, status),
                client_ip(&headers),
            );
            json_ok(json!({"reservation": reservation}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn cancel(
    State(state): State<AppState>,
    Path(code): Path<String>,
    axum::Json(req): axum::Json<CancelRequest>,
) -> Response {
    let code = match ReservationCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return api_error_response(ApiError::validation_failed("code", &e.0)),
    };
    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    match state
        .run_store(move |store| {
            store.cancel_reservation(&code, reason.as_deref())?;
            store.get_reservation(&code)
        })
        .await
    {
        Ok(reservation) => json_ok(json!({"reservation": reservation})),
        Err(err) => api_error_response(err),
    }
}
