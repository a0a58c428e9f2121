use super::{bearer_token, client_ip, json_ok, require_admin, require_customer};
use crate::response::api_error_response;
use crate::session::Identity;
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::{LoginRequest, RegisterRequest, WebLoginRequest};
use petzone_api::ApiError;
use serde_json::json;

pub(crate) async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<LoginRequest>,
) -> Response {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return api_error_response(ApiError::unauthorized("invalid credentials"));
    }
    let password = req.password.clone();
    let lookup = username.clone();
    match state
        .run_store(move |store| store.verify_admin_login(&lookup, &password))
        .await
    {
        Ok(admin) => {
            let token = state.sessions.issue(Identity::Admin {
                id: admin.id,
                username: admin.username.clone(),
                role: admin.role.clone(),
            });
            state.record_activity(
                admin.id,
                admin.username.clone(),
                "auth",
                "login",
                String::new(),
                client_ip(&headers),
            );
            json_ok(json!({"token": token, "user": admin}))
        }
        // A wrong username and a wrong password look the same to callers.
        Err(_) => api_error_response(ApiError::unauthorized("invalid credentials")),
    }
}

pub(crate) async fn admin_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    json_ok(json!({"logged_out": true}))
}

pub(crate) async fn admin_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (admin_id, _) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.get_admin_user(admin_id))
        .await
    {
        Ok(user) => json_ok(json!({"user": user})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn recent_activity(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = require_admin(&state, &headers) {
        return api_error_response(err);
    }
    match state.run_store(|store| store.recent_activity(50)).await {
        Ok(entries) => json_ok(json!({"activity": entries})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn register(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<RegisterRequest>,
) -> Response {
    let (name, email, phone) = match req.validate() {
        Ok(v) => v,
        Err(err) => return api_error_response(err),
    };
    let password = req.password.clone();
    match state
        .run_store(move |store| {
            store.register_web_user(
                name.as_str(),
                email.as_str(),
                phone.as_ref().map(|p| p.as_str()),
                &password,
            )
        })
        .await
    {
        Ok(user) => {
            let token = state.sessions.issue(Identity::Customer {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            });
            json_ok(json!({"token": token, "user": user}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn customer_login(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<WebLoginRequest>,
) -> Response {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return api_error_response(ApiError::unauthorized("invalid credentials"));
    }
    let password = req.password.clone();
    let lookup = email.clone();
    match state
        .run_store(move |store| store.verify_web_login(&lookup, &password))
        .await
    {
        Ok(user) => {
            let token = state.sessions.issue(Identity::Customer {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            });
            json_ok(json!({"token": token, "user": user}))
        }
        Err(_) => api_error_response(ApiError::unauthorized("invalid credentials")),
    }
}

pub(crate) async fn customer_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_customer(&state, &headers) {
        Ok(id) => id,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.get_web_user(user_id)).await {
        Ok(user) => json_ok(json!({"user": user})),
        Err(err) => api_error_response(err),
    }
}
