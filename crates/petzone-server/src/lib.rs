#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use axum::Router;
use petzone_api::ApiError;
use petzone_store::{Store, StoreError};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::error;

pub mod config;
mod http;
mod middleware;
mod response;
pub mod session;

pub use config::{validate_startup_config, ServerConfig};
pub use session::{Identity, SessionStore};

use response::store_error_to_api;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl));
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            sessions,
        }
    }

    /// Runs a storage operation off the async runtime. The single SQLite
    /// connection blocks, so every store call goes through here.
    pub(crate) async fn run_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || op(&store)).await {
            Ok(result) => result.map_err(store_error_to_api),
            Err(e) => {
                error!(err = %e, "storage task panicked or was cancelled");
                Err(ApiError::internal("storage task failure"))
            }
        }
    }

    /// Fire-and-forget audit append for admin actions.
    pub(crate) fn record_activity(
        &self,
        admin_id: i64,
        username: String,
        module: &'static str,
        action: &'static str,
        detail: String,
        ip: Option<String>,
    ) {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            store.log_activity(
                Some(admin_id),
                &username,
                module,
                action,
                Some(&detail),
                ip.as_deref(),
            );
        });
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout;
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/healthz", get(http::health::healthz))
        .route("/readyz", get(http::health::readyz))
        .route("/v1/categories", get(http::catalog::list_categories))
        .route(
            "/v1/products",
            get(http::catalog::list_products).post(http::catalog::create_product),
        )
        .route(
            "/v1/products/:id",
            get(http::catalog::get_product)
                .put(http::catalog::update_product)
                .delete(http::catalog::delete_product),
        )
        .route("/v1/services", get(http::catalog::list_services))
        .route("/v1/services/:id_or_slug", get(http::catalog::get_service))
        .route(
            "/v1/cart",
            get(http::cart::get_cart).delete(http::cart::clear_cart),
        )
        .route(
            "/v1/cart/items",
            post(http::cart::add_item).put(http::cart::update_item),
        )
        .route("/v1/cart/items/:product_id", delete(http::cart::remove_item))
        .route("/v1/cart/count", get(http::cart::cart_count))
        .route("/v1/checkout", post(http::cart::checkout))
        .route("/v1/orders", get(http::orders::list_orders))
        .route("/v1/orders/:code", get(http::orders::get_order))
        .route("/v1/orders/:code/status", put(http::orders::set_status))
        .route(
            "/v1/reservations",
            get(http::reservations::list_recent).post(http::reservations::create),
        )
        .route(
            "/v1/reservations/availability",
            get(http::reservations::availability),
        )
        .route("/v1/reservations/:code", get(http::reservations::get_by_code))
        .route(
            "/v1/reservations/:code/status",
            put(http::reservations::set_status),
        )
        .route(
            "/v1/reservations/:code/cancel",
            post(http::reservations::cancel),
        )
        .route(
            "/v1/appointments",
            get(http::appointments::list).post(http::appointments::create),
        )
        .route("/v1/appointments/stats", get(http::appointments::stats))
        .route(
            "/v1/appointments/:id",
            get(http::appointments::get_by_id)
                .put(http::appointments::update)
                .delete(http::appointments::remove),
        )
        .route(
            "/v1/appointments/:id/status",
            put(http::appointments::set_status),
        )
        .route("/v1/sliders/active", get(http::content::active_sliders))
        .route(
            "/v1/sliders",
            get(http::content::list_sliders).post(http::content::create_slider),
        )
        .route(
            "/v1/sliders/:id",
            put(http::content::update_slider).delete(http::content::delete_slider),
        )
        .route(
            "/v1/announcements/active",
            get(http::content::active_announcements),
        )
        .route(
            "/v1/announcements",
            get(http::content::list_announcements).post(http::content::create_announcement),
        )
        .route(
            "/v1/announcements/:id",
            put(http::content::update_announcement).delete(http::content::delete_announcement),
        )
        .route("/v1/auth/login", post(http::auth::admin_login))
        .route("/v1/auth/logout", post(http::auth::admin_logout))
        .route("/v1/auth/me", get(http::auth::admin_me))
        .route("/v1/auth/activity", get(http::auth::recent_activity))
        .route("/v1/account/register", post(http::auth::register))
        .route("/v1/account/login", post(http::auth::customer_login))
        .route("/v1/account/me", get(http::auth::customer_me))
        .route("/v1/stats/dashboard", get(http::stats::dashboard))
        .route("/v1/stats/sales/monthly", get(http::stats::monthly_sales))
        .route("/v1/stats/products/top", get(http::stats::top_products))
        .route(
            "/v1/stats/products/by-category",
            get(http::stats::products_by_category),
        )
        .route(
            "/v1/stats/reservations/by-service",
            get(http::stats::reservations_by_service),
        )
        .layer(from_fn(middleware::request_tracing_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
