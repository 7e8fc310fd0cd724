//! Question endpoint

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, Document, DocumentSource, Outcome, SubmissionStrategy};

/// Header carrying the caller's Gemini API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// POST /api/ask - Answer a question about an uploaded (or the default) document
///
/// Multipart fields: `file` (optional), `question`, `strategy` (optional).
/// The response body is the run's outcome; failed runs use the status code
/// of their error.
pub async fn ask_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Outcome>)> {
    let mut document: Option<Document> = None;
    let mut question = String::new();
    let mut strategy: Option<SubmissionStrategy> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read file: {}", e)))?;

                tracing::info!("Received file: {} ({} bytes)", filename, data.len());

                let mut upload = Document::new(filename, data);
                if let Some(content_type) = content_type {
                    upload = upload.with_mime_type(content_type);
                }
                document = Some(upload);
            }
            "question" => {
                question = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read question: {}", e)))?;
            }
            "strategy" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read strategy: {}", e)))?;
                if !raw.trim().is_empty() {
                    strategy = Some(raw.parse().map_err(Error::InvalidInput)?);
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let source = match document {
        Some(document) => DocumentSource::Upload(document),
        None => default_source(&state)?,
    };

    let mut request = AskRequest::new(source, question);
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        request = request.with_credential(key);
    }
    if let Some(strategy) = strategy {
        request = request.with_strategy(strategy);
    }

    // A client that disconnects drops this handler; the guard then cancels the run
    let cancel = CancellationToken::new();
    let _disconnect = cancel.clone().drop_guard();
    let pipeline = state.pipeline().clone();
    let outcome = tokio::spawn(async move { pipeline.run(request, None, cancel).await })
        .await
        .map_err(|e| Error::internal(format!("Ask task failed: {}", e)))?;

    let status = outcome
        .failure()
        .map(|(_, error)| error.http_status())
        .unwrap_or(StatusCode::OK);

    Ok((status, Json(outcome)))
}

/// The configured fixed document, used when no file was uploaded
fn default_source(state: &AppState) -> Result<DocumentSource> {
    let document = &state.config().document;
    let path = document.default_path.clone().ok_or_else(|| {
        Error::InvalidInput("No file uploaded and no default document configured".to_string())
    })?;

    Ok(DocumentSource::Path {
        path,
        mime_type: document.default_mime_type.clone(),
    })
}
