// Entity Lens - web search and LLM extraction over a column of entities

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // SerpAPI Google search
pub mod dataset;   // CSV uploads and Google Sheets
pub mod export;
pub mod routes;
pub mod middleware;
pub mod utils;
pub mod cli;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
