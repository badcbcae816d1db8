use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    error::{AppError, AppResult, DataValidationError},
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod actions;
pub mod recommendations;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(health_check))
        .route(
            "/recommendations",
            get(recommendations::list).post(recommendations::create),
        )
        .route(
            "/recommendations/source-product",
            get(recommendations::by_source_item),
        )
        .route(
            "/recommendations/:id",
            get(recommendations::get)
                .put(recommendations::update)
                .delete(recommendations::delete),
        )
        .route("/recommendations/:id/like", put(actions::like))
        .route("/recommendations/:id/deactivation", put(actions::deactivate))
        .route("/recommendations/:id/activation", put(actions::activate))
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

async fn index() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "name": "Recommendation REST API Service",
            "version": "1.0",
        })),
    )
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": 200, "message": "Healthy" })),
    )
}

/// Requires an `application/json` content type and parses the body
pub(crate) fn json_body(headers: &HeaderMap, body: &[u8]) -> AppResult<Value> {
    const EXPECTED: &str = "application/json";

    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        tracing::warn!("No Content-Type specified");
        return Err(AppError::UnsupportedMediaType(format!(
            "Content-Type must be {EXPECTED}"
        )));
    };

    let essence = content_type
        .to_str()
        .ok()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if !essence.eq_ignore_ascii_case(EXPECTED) {
        tracing::warn!(content_type = ?content_type, "Invalid Content-Type");
        return Err(AppError::UnsupportedMediaType(format!(
            "Content-Type must be {EXPECTED}"
        )));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Unparseable request body");
        DataValidationError::NotAnObject.into()
    })
}
