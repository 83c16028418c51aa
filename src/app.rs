//! HTTP surface: routes, handlers, and error → response mapping.
//!
//! - `POST /predict` – run a prediction query
//! - `GET /options`  – distinct branches, districts, years, and cutoff keys
//! - `GET /health`   – liveness plus loaded row count

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::data::filter::PredictRequest;
use crate::data::model::CutoffRecord;
use crate::error::QueryError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>, cors: bool) -> Router {
    let router = Router::new()
        .route("/predict", post(predict))
        .route("/options", get(options))
        .route("/health", get(health))
        .with_state(state);

    if cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Query(QueryError::MissingInput(fields)) => json!({
                "error": self.to_string(),
                "missing": fields,
            }),
            ApiError::Query(QueryError::InvalidRank(_)) => json!({
                "error": self.to_string(),
                "invalid": ["rank"],
            }),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PredictResponse<'a> {
    result: &'a [&'a CutoffRecord],
    key: &'a str,
    count: usize,
    known_key: bool,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Response, ApiError> {
    log::debug!("Received request: {req:?}");
    let outcome = state.predict(req)?;

    // Serialize while the borrow of `state` is still live.
    Ok(Json(PredictResponse {
        result: &outcome.results,
        key: &outcome.key,
        count: outcome.results.len(),
        known_key: outcome.known_key,
    })
    .into_response())
}

async fn options(State(state): State<Arc<AppState>>) -> Response {
    Json(state.filter_options()).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "records": state.table.len() }))
}
