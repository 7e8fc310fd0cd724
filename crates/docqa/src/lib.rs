//! docqa: answer questions about a single document with Google Gemini
//!
//! A document (plain text, Markdown, PDF or `.xlsx`) goes through format
//! detection and text extraction, is handed to the service either inline or
//! as an uploaded file polled until ready, and the question is answered by a
//! single `generateContent` call. Every run ends in an [`Outcome`]: the
//! answer, or the stage that failed and why.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

pub use config::DocQaConfig;
pub use error::{Error, Result};
pub use processing::Pipeline;
pub use providers::{GeminiClient, GenerativeService};
pub use types::{
    Answer, AskRequest, Credential, Document, DocumentSource, FormatKind, Outcome, Stage,
    StageEvent, SubmissionStrategy,
};

/// Re-exported so callers can cancel runs without depending on tokio-util
pub use tokio_util::sync::CancellationToken;
