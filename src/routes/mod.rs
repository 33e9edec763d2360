//! API Routes
//!
//! - `/upload_csv`, `/connect_google_sheet` - load a table and preview rows
//! - `/search_entities` - one web search per entity
//! - `/extract_information` - one LLM extraction per entity
//! - `/export_csv` - download extraction results
//! - `/api/health` - health check

pub mod entities;
pub mod export;
pub mod files;
pub mod health;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::AppState;
use crate::types::{AppError, AppResult};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(files::router(state.clone()))
        .merge(entities::router(state))
        .merge(export::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Unwrap a JSON body, reporting malformed payloads as 400 `{error}`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}
