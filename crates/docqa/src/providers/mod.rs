//! Provider abstractions for the remote generative-language service

pub mod gemini;
pub mod llm;

pub use gemini::GeminiClient;
pub use llm::{FileUpload, GenerativeService};
