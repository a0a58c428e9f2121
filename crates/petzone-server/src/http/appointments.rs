use super::{client_ip, json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::{NewAppointmentRequest, StatusChangeRequest, UpdateAppointmentRequest};
use petzone_api::{params, ApiError};
use petzone_model::AppointmentStatus;
use petzone_store::{AppointmentFilter, AppointmentInput};
use serde_json::json;

pub(crate) async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<NewAppointmentRequest>,
) -> Response {
    let request = match req.validate() {
        Ok(r) => r,
        Err(err) => return api_error_response(err),
    };
    let input = AppointmentInput {
        name: request.name.as_str().to_string(),
        email: request.email.as_str().to_string(),
        phone: request.phone.as_str().to_string(),
        service: request.service,
        message: request.message,
        ip_address: client_ip(&headers),
    };
    match state
        .run_store(move |store| store.create_appointment(&input))
        .await
    {
        Ok(appointment) => json_ok(json!({"appointment": appointment})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QueryMap>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    let parsed = match params::parse_appointment_list(&query) {
        Ok(p) => p,
        Err(err) => return api_error_response(err),
    };
    let filter = AppointmentFilter {
        status: parsed.status,
        search: parsed.search,
        page: parsed.pagination.page,
        limit: parsed.pagination.limit,
    };
    match state
        .run_store(move |store| store.list_appointments(&filter))
        .await
    {
        Ok(page) => json_ok(json!({
            "appointments": page.appointments,
            "total": page.total,
            "page": page.page,
            "pages": page.pages,
        })),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn get_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(move |store| store.get_appointment(id)).await {
        Ok(appointment) => json_ok(json!({"appointment": appointment})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    axum::Json(req): axum::Json<UpdateAppointmentRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    if let Err(err) = req.validate() {
        return api_error_response(err);
    }
    let status = match AppointmentStatus::parse(&req.status) {
        Ok(status) => status,
        Err(e) => return api_error_response(ApiError::validation_failed("status", &e.0)),
    };
    match state
        .run_store(move |store| {
            store.update_appointment(
                id,
                req.name.trim(),
                req.email.trim(),
                req.phone.trim(),
                req.service.trim(),
                req.message.as_deref(),
                status,
            )
        })
        .await
    {
        Ok(appointment) => {
            state.record_activity(
                admin_id,
                username,
                "appointments",
                "update",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"appointment": appointment}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn set_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    axum::Json(req): axum::Json<StatusChangeRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    let status = match AppointmentStatus::parse(&req.status) {
        Ok(status) => status,
        Err(e) => return api_error_response(ApiError::validation_failed("status", &e.0)),
    };
    match state
        .run_store(move |store| {
            store.set_appointment_status(id, status)?;
            store.get_appointment(id)
        })
        .await
    {
        Ok(appointment) => {
            state.record_activity(
                admin_id,
                username,
                "appointments",
                "status",
                format!("id={id} status={status}"),
                client_ip(&headers),
            );
            json_ok(json!({"appointment": appointment}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.delete_appointment(id))
        .await
    {
        Ok(()) => {
            state.record_activity(
                admin_id,
                username,
                "appointments",
                "delete",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"deleted": id}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(|store| store.appointment_stats()).await {
        Ok(stats) => json_ok(json!({"stats": stats})),
        Err(err) => api_error_response(err),
    }
}
