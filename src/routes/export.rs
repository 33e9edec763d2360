use axum::{
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::info;

use super::json_body;
use crate::agents::ExtractionMap;
use crate::export::{extraction_csv, EXPORT_FILE_NAME};
use crate::types::AppResult;

pub fn router() -> Router {
    Router::new().route("/export_csv", post(export_csv))
}

/// POST /export_csv - extraction results as a CSV download
async fn export_csv(payload: Result<Json<ExtractionMap>, JsonRejection>) -> AppResult<Response> {
    let results = json_body(payload)?;
    info!(entities = results.len(), "Exporting extraction results");

    let data = extraction_csv(&results)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        data,
    )
        .into_response())
}
