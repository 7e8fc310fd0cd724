//! Gemini client for file upload and answer generation
//!
//! Talks to the Generative Language REST API: resumable uploads through
//! `upload/v1beta/files`, status checks on `v1beta/files/*` and answers from
//! `models/*:generateContent`. The API key travels in a header so it never
//! ends up in URLs or error messages.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::generation::Prompt;
use crate::providers::llm::{FileUpload, GenerativeService};
use crate::types::{Credential, RawResponse, ReadinessState, UploadHandle};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const MAX_ERROR_BODY: usize = 512;

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            request_timeout: config.request_timeout(),
            upload_timeout: config.upload_timeout(),
        })
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_endpoint(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name)
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Classify a failure of the generation call
fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else if err.is_connect() {
        Error::Connection(err.to_string())
    } else {
        Error::Request(err.to_string())
    }
}

/// Any failure on the upload/status path is a transport error
fn transport_error(action: &str, err: reqwest::Error) -> Error {
    Error::transport(format!("{} failed: {}", action, err))
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Turn a non-2xx reply on the upload/status path into a transport error
async fn ensure_upload_success(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::transport(format!(
        "{} failed ({}): {}",
        action,
        status,
        truncate_body(body)
    )))
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: RemoteFile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<RemoteStatus>,
}

#[derive(Deserialize)]
struct RemoteStatus {
    #[serde(default)]
    message: String,
}

impl RemoteFile {
    fn into_handle(self) -> Result<UploadHandle> {
        if self.name.is_empty() || self.uri.is_empty() {
            return Err(Error::malformed("File resource is missing its name or uri"));
        }
        Ok(UploadHandle {
            state: ReadinessState::from_remote(self.state.as_deref().unwrap_or("")),
            name: self.name,
            uri: self.uri,
            mime_type: self.mime_type,
            error: self.error.map(|e| e.message),
        })
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn upload_file(
        &self,
        upload: FileUpload,
        credential: &Credential,
    ) -> Result<UploadHandle> {
        // Step 1: open a resumable upload session
        let start = self
            .client
            .post(self.upload_endpoint())
            .header(API_KEY_HEADER, credential.expose())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", upload.data.len())
            .header("X-Goog-Upload-Header-Content-Type", upload.mime_type.as_str())
            .json(&serde_json::json!({ "file": { "display_name": upload.display_name } }))
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| transport_error("Upload start", e))?;
        let start = ensure_upload_success(start, "Upload start").await?;

        let session_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Error::transport("Upload start response has no upload URL"))?;

        // Step 2: send the bytes and finalize
        let response = self
            .client
            .post(&session_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(upload.data)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| transport_error("Upload", e))?;
        let response = ensure_upload_success(response, "Upload").await?;

        let envelope: FileEnvelope = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("Failed to parse upload response: {}", e)))?;

        let handle = envelope.file.into_handle()?;
        tracing::info!(
            "Uploaded '{}' as {} (state: {:?})",
            upload.display_name,
            handle.name,
            handle.state
        );
        Ok(handle)
    }

    async fn get_file(&self, name: &str, credential: &Credential) -> Result<UploadHandle> {
        let response = self
            .client
            .get(self.file_endpoint(name))
            .header(API_KEY_HEADER, credential.expose())
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| transport_error("File status", e))?;
        let response = ensure_upload_success(response, "File status").await?;

        let file: RemoteFile = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("Failed to parse file status: {}", e)))?;
        file.into_handle()
    }

    async fn delete_file(&self, name: &str, credential: &Credential) -> Result<()> {
        let response = self
            .client
            .delete(self.file_endpoint(name))
            .header(API_KEY_HEADER, credential.expose())
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| transport_error("File delete", e))?;
        ensure_upload_success(response, "File delete").await?;
        Ok(())
    }

    async fn generate_content(
        &self,
        prompt: &Prompt,
        credential: &Credential,
    ) -> Result<RawResponse> {
        let response = self
            .client
            .post(self.generate_endpoint())
            .header(API_KEY_HEADER, credential.expose())
            .json(prompt)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                code,
                body: truncate_body(body),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        Ok(RawResponse::new(body))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
