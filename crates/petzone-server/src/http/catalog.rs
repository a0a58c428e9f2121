use super::{client_ip, json_ok, require_admin, QueryMap};
use crate::response::api_error_response;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use petzone_api::dto::ProductUpsertRequest;
use petzone_api::{params, ApiError};
use petzone_model::Money;
use petzone_store::{ProductFilter, ProductInput};
use serde_json::json;

pub(crate) async fn list_categories(State(state): State<AppState>) -> Response {
    match state.run_store(|store| store.list_categories()).await {
        Ok(categories) => json_ok(json!({"categories": categories})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Response {
    let parsed = match params::parse_product_list(&query) {
        Ok(p) => p,
        Err(err) => return api_error_response(err),
    };
    let filter = ProductFilter {
        category_id: parsed.category_id,
        search: parsed.search,
    };
    match state.run_store(move |store| store.list_products(&filter)).await {
        Ok(products) => json_ok(json!({"products": products})),
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match state.run_store(move |store| store.get_product(id)).await {
        Ok(product) => json_ok(json!({"product": product})),
        Err(err) => api_error_response(err),
    }
}

fn product_input(req: &ProductUpsertRequest) -> Result<ProductInput, ApiError> {
    req.validate()?;
    let price = Money::from_cents(req.price_cents)
        .map_err(|e| ApiError::validation_failed("price_cents", &e.0))?;
    Ok(ProductInput {
        name: req.name.trim().to_string(),
        description: req.description.clone(),
        category_id: req.category_id,
        price,
        stock: req.stock,
        image: req.image.clone(),
        sku: req.sku.clone(),
        featured: req.featured,
    })
}

pub(crate) async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<ProductUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    let input = match product_input(&req) {
        Ok(input) => input,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.create_product(&input)).await {
        Ok(product) => {
            state.record_activity(
                admin_id,
                username,
                "products",
                "create",
                format!("id={} name={}", product.id, product.name),
                client_ip(&headers),
            );
            json_ok(json!({"product": product}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn update_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    axum::Json(req): axum::Json<ProductUpsertRequest>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    let input = match product_input(&req) {
        Ok(input) => input,
        Err(err) => return api_error_response(err),
    };
    match state
        .run_store(move |store| store.update_product(id, &input))
        .await
    {
        Ok(product) => {
            state.record_activity(
                admin_id,
                username,
                "products",
                "update",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"product": product}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn delete_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let (admin_id, username) = match require_admin(&state, &headers) {
        Ok(admin) => admin,
        Err(err) => return api_error_response(err),
    };
    match state.run_store(move |store| store.delete_product(id)).await {
        Ok(()) => {
            state.record_activity(
                admin_id,
                username,
                "products",
                "delete",
                format!("id={id}"),
                client_ip(&headers),
            );
            json_ok(json!({"deleted": id}))
        }
        Err(err) => api_error_response(err),
    }
}

pub(crate) async fn list_services(State(state): State<AppState>) -> Response {
    match state.run_store(|store| store.list_services()).await {
        Ok(services) => json_ok(json!({"services": services})),
        Err(err) => api_error_response(err),
    }
}

/// Accepts either a numeric id or a slug in the path segment.
pub(crate) async fn get_service(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Response {
    let result = match id_or_slug.parse::<i64>() {
        Ok(id) => state.run_store(move |store| store.get_service(id)).await,
        Err(_) => {
            state
                .run_store(move |store| store.get_service_by_slug(&id_or_slug))
                .await
        }
    };
    match result {
        Ok(service) => json_ok(json!({"service": service})),
        Err(err) => api_error_response(err),
    }
}
