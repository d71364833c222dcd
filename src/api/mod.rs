//! REST API endpoints.
//!
//! Axum-based HTTP API serving player, map and team statistics computed from
//! the configured data source.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::calculate::StatsError;
use crate::ingest::{DateRange, IngestError};

use self::state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
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
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
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

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            // nothing to show for the selection
            StatsError::EmptyInput(msg) | StatsError::DivisionByZero(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidRange(msg) => ApiError::BadRequest(msg),
            IngestError::Stats(e) => e.into(),
            other => {
                warn!("Data source failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Date range query parameters shared by every statistics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeParams {
    pub fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange::parse(self.from.as_deref(), self.to.as_deref())?)
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin '{}', allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/api/health", get(routes::meta::health))
        .route("/api/summary", get(routes::meta::summary))
        .route("/api/players", get(routes::players::general))
        .route("/api/players/kd", get(routes::players::kd))
        .route("/api/players/ranks", get(routes::players::ranks))
        .route("/api/players/kills-by-agent", get(routes::players::kills_by_agent))
        .route("/api/players/shooting", get(routes::players::shooting))
        .route("/api/maps", get(routes::analytics::maps))
        .route("/api/win-rate", get(routes::analytics::win_rate))
        .route("/api/teams", get(routes::team::teams))
        .route("/api/teams/overview", get(routes::team::overview))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
