//! API handlers for the token server.

use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use spill_types::{ConnectionDetails, HealthStatus, TokenRequest};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Bodies carry a single `detail` field, the shape existing clients parse.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unprocessable request: {0}")]
    UnprocessableEntity(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "detail": message
        }));

        (status, body).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::UnprocessableEntity(rejection.body_text())
    }
}

fn issue(state: &AppState, request: &TokenRequest) -> Result<Json<ConnectionDetails>, ApiError> {
    state.issuer.issue(request).map(Json).map_err(|e| {
        tracing::error!(
            room = %request.room_name,
            participant = %request.participant_name,
            "error generating token: {}",
            e
        );
        ApiError::InternalServerError(e.to_string())
    })
}

/// Handler for `GET /`.
pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::default())
}

/// Handler for `GET /getToken?roomName=..&participantName=..`.
pub async fn get_token_query_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<TokenRequest>, QueryRejection>,
) -> Result<Json<ConnectionDetails>, ApiError> {
    let Query(request) = query?;
    issue(&state, &request)
}

/// Handler for `POST /getToken`.
pub async fn get_token_body_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<ConnectionDetails>, ApiError> {
    let Json(request) = payload?;
    issue(&state, &request)
}
