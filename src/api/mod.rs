//! REST API endpoints.
//!
//! Axum-based HTTP API over the ladder board: the board view, single
//! ladders, the raw snapshot, and refresh control.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!("Invalid CORS origin {:?}, allowing any", origin);
                AllowOrigin::from(Any)
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .route("/api/health", get(routes::board::health))
        .route("/api/board", get(routes::board::board))
        .route("/api/ladders/:group/:arm", get(routes::board::ladder))
        .route("/api/snapshot", get(routes::board::snapshot))
        .route("/api/refresh", post(routes::refresh::refresh_now))
        .route("/api/refresh/live", post(routes::refresh::start_live))
        .route("/api/refresh/status", get(routes::refresh::refresh_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
