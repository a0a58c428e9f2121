use super::{client_ip, json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::{AnnouncementUpsertRequest, SliderUpsertRequest};
use petzone_store::{AnnouncementInput, SliderInput};
use serde_json::json;

fn slider_input(req: &SliderUpsertRequest) -> SliderInput {
    SliderInput {
        title: req.title.trim().to_string(),
        description: req.description.clone(),
        image: req.image.trim().to_string(),
        link: req.link.clone(),
        position: req.position.trim().to_string(),
        sort_order: req.sort_order,
        active: req.active,
    }
}

fn announcement_input(req: &AnnouncementUpsertRequest) -> AnnouncementInput {
    AnnouncementInput {
        message: req.message.trim().to_string(),
        kind: req.kind.trim().to_string(),
        background_color: req.background_color.clone(),
        text_color: req.text_color.clone(),
        icon: req.icon.clone(),
        speed: req.speed,
        priority: req.priority,
        active: req.active,
    }
}

pub(crate) async fn active_sliders(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Response {
    let position = query
        .get("position")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "home".to_string());
    match state
        .run_store(move |store| store.active_sliders(&position))
        .await
    {
        Ok(sliders) => json_ok(json!({"sliders": sliders})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list_sliders(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(|store| store.list_sliders()).await {
        Ok(sliders) => json_ok(json!({"sliders": sliders})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn create_slider(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<SliderUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    if let Err(err) = req.validate() {
        return api_error_response(err);
    }
    let input = slider_input(&req);
    match state.run_store(move |store| store.create_slider(&input)).await {
        Ok(slider) => {
            state.record_activity(
                admin_id,
                username,
                "sliders",
                "create",
                format!("id={}", slider.id),
                client_ip(&headers),
            );
            json_ok(json!({"slider": slider}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn update_slider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    axum::Json(req): axum::Json<SliderUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    if let Err(err) = req.validate() {
        return api_error_response(err);
    }
    let input = slider_input(&req);
    match state
        .run_store(move |store| store.update_slider(id, &input))
        .await
    {
        Ok(slider) => {
            state.record_activity(
                admin_id,
                username,
                "sliders",
                "update",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"slider": slider}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn delete_slider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.delete_slider(id)).await {
        Ok(()) => {
            state.record_activity(
                admin_id,
                username,
                "sliders",
                "delete",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"deleted": id}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn active_announcements(State(state): State<AppState>) -> Response {
    match state.run_store(|store| store.active_announcements()).await {
        Ok(announcements) => json_ok(json!({"announcements": announcements})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list_announcements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(|store| store.list_announcements()).await {
        Ok(announcements) => json_ok(json!({"announcements": announcements})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn create_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<AnnouncementUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    if let Err(err) = req.validate() {
        return api_error_response(err);
    }
    let input = announcement_input(&req);
    match state
        .run_store(move |store| store.create_announcement(&input))
        .await
    {
        Ok(announcement) => {
            state.record_activity(
                admin_id,
                username,
                "announcements",
                "create",
                format!("id={}", announcement.id),
                client_ip(&headers),
            );
            json_ok(json!({"announcement": announcement}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn update_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    axum::Json(req): axum::Json<AnnouncementUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    if let Err(err) = req.validate() {
        return api_error_response(err);
    }
    let input = announcement_input(&req);
    match state
        .run_store(move |store| store.update_announcement(id, &input))
        .await
    {
        Ok(announcement) => {
            state.record_activity(
                admin_id,
                username,
                "announcements",
                "update",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"announcement": announcement}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn delete_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.delete_announcement(id))
        .await
    {
        Ok(()) => {
            state.record_activity(
                admin_id,
                username,
                "announcements",
                "delete",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"deleted": id}))
        }
        Err(err) => api_error_response(err),
    }
}
