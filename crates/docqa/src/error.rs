//! Error types for the document question-answering pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Every variant maps to one entry of the failure taxonomy reported to
/// callers through [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    /// The document's format is not one we can extract text from
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Text document is not valid UTF-8
    #[error("Failed to decode '{filename}' as UTF-8: {message}")]
    Decode { filename: String, message: String },

    /// Document container could not be opened or read
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Extraction succeeded but produced only whitespace
    #[error("Document '{0}' contains no extractable text")]
    EmptyDocument(String),

    /// Uploaded file settled into the FAILED state
    #[error("Upload rejected by the service: {0}")]
    UploadRejected(String),

    /// Uploaded file never became active within the poll bound
    #[error("Uploaded file was not ready after {attempts} status checks")]
    UploadTimeout { attempts: u32 },

    /// Network failure while uploading or polling
    #[error("Transport error: {0}")]
    Transport(String),

    /// Generation request exceeded its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Generation endpoint could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Generation endpoint answered with a non-2xx status
    #[error("Generation endpoint returned HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },

    /// Any other transport-level fault on the generation call
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body does not have the expected structure
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No API key was supplied
    #[error("An API key is required to ask questions")]
    MissingCredential,

    /// Question is empty or whitespace
    #[error("The question is empty")]
    EmptyQuestion,

    /// Front-end request could not be understood
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Caller abandoned the request
    #[error("Request was cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a decode error
    pub fn decode(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Taxonomy name reported to front-ends as `errorKind`
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "UnsupportedFormatError",
            Error::Decode { .. } => "DecodeError",
            Error::Extraction { .. } => "ExtractionError",
            Error::EmptyDocument(_) => "EmptyDocumentError",
            Error::UploadRejected(_) => "UploadRejectedError",
            Error::UploadTimeout { .. } => "UploadTimeoutError",
            Error::Transport(_) => "TransportError",
            Error::Timeout(_) => "TimeoutError",
            Error::Connection(_) => "ConnectionError",
            Error::HttpStatus { .. } => "HttpStatusError",
            Error::Request(_) => "RequestError",
            Error::MalformedResponse(_) => "MalformedResponseError",
            Error::MissingCredential => "MissingCredentialError",
            Error::EmptyQuestion => "EmptyQuestionError",
            Error::InvalidInput(_) => "InvalidInputError",
            Error::Cancelled => "CancelledError",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
            Error::Internal(_) => "InternalError",
        }
    }

    /// Upstream HTTP status carried by `HttpStatusError`
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// HTTP status used when this error is returned by the server
    pub fn http_status(&self) -> StatusCode {
        match self {
            Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Decode { .. }
            | Error::Extraction { .. }
            | Error::EmptyDocument(_)
            | Error::EmptyQuestion => StatusCode::UNPROCESSABLE_ENTITY,
            Error::MissingCredential => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::UploadRejected(_)
            | Error::Transport(_)
            | Error::Connection(_)
            | Error::HttpStatus { .. }
            | Error::Request(_)
            | Error::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Error::UploadTimeout { .. } | Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
