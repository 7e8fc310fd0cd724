//! Core types for the question-answering pipeline

pub mod document;
pub mod query;
pub mod response;
pub mod upload;

pub use document::{Document, DocumentSource, ExtractedText, FormatKind};
pub use query::{AskRequest, Credential, SubmissionStrategy};
pub use response::{Answer, Outcome, RawResponse, Stage, StageEvent, NO_ANSWER};
pub use upload::{ReadinessState, UploadHandle};
