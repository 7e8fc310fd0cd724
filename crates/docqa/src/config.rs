//! Configuration for the docqa pipeline and front-ends

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::SubmissionStrategy;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocQaConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Remote generative-language service
    pub service: ServiceConfig,
    /// Document submission and readiness polling
    pub submission: SubmissionConfig,
    /// Generation settings sent with every prompt
    pub generation: GenerationConfig,
    /// Document extraction and the fixed local document
    pub document: DocumentConfig,
}

impl DocQaConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read config {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from TOML; missing sections take their defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `DOCQA_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base_url) = lookup("DOCQA_BASE_URL") {
            self.service.base_url = base_url;
        }
        if let Some(model) = lookup("DOCQA_MODEL") {
            self.service.model = model;
        }
        if let Some(host) = lookup("DOCQA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DOCQA_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid DOCQA_PORT '{}': {}", port, e)))?;
        }
        if let Some(strategy) = lookup("DOCQA_STRATEGY") {
            self.submission.strategy = strategy.parse().map_err(Error::Config)?;
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Generative-language service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Timeout for the generation call in seconds
    pub request_timeout_secs: u64,
    /// Timeout for upload and status calls in seconds
    pub upload_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-pro".to_string(),
            request_timeout_secs: 30,
            upload_timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

/// Submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Default strategy when a request does not choose one
    pub strategy: SubmissionStrategy,
    /// Wait between readiness checks in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum number of readiness checks
    pub max_poll_attempts: u32,
    /// Delete uploaded files once the answer was generated
    pub delete_after_use: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            strategy: SubmissionStrategy::Handle,
            poll_interval_ms: 2_000,
            max_poll_attempts: 10,
            delete_after_use: true,
        }
    }
}

impl SubmissionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }
}

/// Document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Document used when a request does not carry one
    pub default_path: Option<PathBuf>,
    /// Declared MIME type of the default document
    pub default_mime_type: Option<String>,
    /// Upper bound for PDF text extraction in seconds
    pub pdf_timeout_secs: u64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            default_path: Some(PathBuf::from("./Document/marcopolo.pdf")),
            default_mime_type: Some("application/pdf".to_string()),
            pdf_timeout_secs: 60,
        }
    }
}

impl DocumentConfig {
    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_timeout_secs)
    }
}
