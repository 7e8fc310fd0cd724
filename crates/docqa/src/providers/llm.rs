//! Generative-language service abstraction

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::generation::Prompt;
use crate::types::{Credential, RawResponse, UploadHandle};

/// Content sent to the upload endpoint
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Name shown in the service's file listing
    pub display_name: String,
    /// MIME type of `data`
    pub mime_type: String,
    pub data: Bytes,
}

/// Remote service that stores uploaded files and generates text
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (files + generateContent)
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Upload a blob; the returned handle may still be pending
    async fn upload_file(&self, upload: FileUpload, credential: &Credential)
        -> Result<UploadHandle>;

    /// Re-query the state of an uploaded file by resource name
    async fn get_file(&self, name: &str, credential: &Credential) -> Result<UploadHandle>;

    /// Remove an uploaded file
    async fn delete_file(&self, name: &str, credential: &Credential) -> Result<()>;

    /// Issue one generation call and return the raw body of a 2xx reply
    async fn generate_content(&self, prompt: &Prompt, credential: &Credential)
        -> Result<RawResponse>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
