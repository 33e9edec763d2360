use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use super::json_body;
use crate::agents::{entity_keys, ExtractionAgent, ExtractionMap, SearchAgent, SearchResultSet};
use crate::models::{AppState, ExtractionRequest, SearchRequest};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search_entities", post(search_entities))
        .route("/extract_information", post(extract_information))
        .with_state(state)
}

async fn search_entities(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<SearchResultSet>> {
    let request = json_body(payload)?;

    let (Some(entities), Some(prompt_template)) = (request.entities, request.prompt_template) else {
        return Err(AppError::InvalidRequest(
            "Invalid payload. 'entities' and 'prompt_template' are required.".to_string(),
        ));
    };

    let template = SearchAgent::parse_template(&prompt_template)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid prompt_template: {}", e)))?;

    let entities = entity_keys(&entities);
    info!(entities = entities.len(), "Search request received");

    let batch = state.search_agent.search_entities(&entities, &template).await;
    Ok(Json(batch.into_search_map()))
}

async fn extract_information(
    State(state): State<AppState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> AppResult<Json<ExtractionMap>> {
    let request = json_body(payload)?;

    let (Some(entities), Some(search_results), Some(prompt_template)) =
        (request.entities, request.search_results, request.prompt_template)
    else {
        return Err(AppError::InvalidRequest(
            "Invalid payload. 'entities', 'search_results', and 'prompt_template' are required."
                .to_string(),
        ));
    };

    let template = ExtractionAgent::parse_template(&prompt_template)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid prompt_template: {}", e)))?;

    let entities = entity_keys(&entities);
    info!(entities = entities.len(), "Extraction request received");

    let batch = state
        .extraction_agent
        .extract_entities(&entities, &search_results, &template)
        .await;
    Ok(Json(batch.into_extraction_map()))
}
