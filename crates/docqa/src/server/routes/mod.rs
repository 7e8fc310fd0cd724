//! API routes for the docqa server

pub mod ask;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/ask",
            post(ask::ask_question).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let pipeline = state.pipeline();
    let document = &state.config().document;

    Json(serde_json::json!({
        "name": "docqa",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions about a document using Google Gemini",
        "service": pipeline.service_name(),
        "model": pipeline.model(),
        "defaultStrategy": pipeline.default_strategy(),
        "defaultDocument": document.default_path.as_ref().map(|p| p.display().to_string()),
        "formats": ["txt", "md", "pdf", "xlsx"],
        "endpoints": {
            "GET /health": "Liveness check",
            "GET /api/info": "This document",
            "POST /api/ask": "Multipart: file (optional), question, strategy (inline|handle); API key in x-api-key"
        }
    }))
}
