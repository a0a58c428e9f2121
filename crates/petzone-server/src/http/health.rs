use super::json_ok;
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::State;
use axum::response::Response;
use serde_json::json;

pub(crate) async fn healthz() -> Response {
    json_ok(json!({"status": "ok"}))
}

/// Ready once the database answers a trivial query.
pub(crate) async fn readyz(State(state): State<AppState>) -> Response {
    match state.run_store(|store| store.list_categories().map(|_| ())).await {
        Ok(()) => json_ok(json!({"status": "ready"})),
        Err(err) => api_error_response(err),
    }
}
