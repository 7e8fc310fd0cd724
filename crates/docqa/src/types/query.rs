//! Ask request types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::DocumentSource;

/// How the document reaches the generation endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStrategy {
    /// Extracted text is embedded in the prompt
    Inline,
    /// Content is uploaded once and referenced by URI
    #[default]
    Handle,
}

impl std::str::FromStr for SubmissionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "handle" | "upload" => Ok(Self::Handle),
            other => Err(format!(
                "unknown submission strategy '{}' (expected 'inline' or 'handle')",
                other
            )),
        }
    }
}

impl fmt::Display for SubmissionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::Handle => f.write_str("handle"),
        }
    }
}

/// API key for the generative-language service
///
/// Supplied once per request and never logged: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, treating blank input as absent
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw key, for the request header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One question against one document
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// Where the document comes from
    pub source: DocumentSource,
    /// The question, passed through verbatim
    pub question: String,
    /// API key; blank input is stored as absent
    pub credential: Option<Credential>,
    /// Overrides the configured submission strategy
    pub strategy: Option<SubmissionStrategy>,
}

impl AskRequest {
    pub fn new(source: DocumentSource, question: impl Into<String>) -> Self {
        Self {
            source,
            question: question.into(),
            credential: None,
            strategy: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Credential::new(credential);
        self
    }

    pub fn with_strategy(mut self, strategy: SubmissionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}
