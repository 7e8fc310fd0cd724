//! Prompt construction for generateContent

use serde::Serialize;

use crate::config::GenerationConfig;
use crate::types::{ExtractedText, SubmissionStrategy, UploadHandle};

const GROUNDING_RULES: &str = "You are a document-grounded assistant. Answer the user's question \
using ONLY information stated in the document. If the document does not contain the answer, \
say that the information is not available in the document. Do not use outside knowledge.";

/// How the prompt refers to the document
#[derive(Debug, Clone, Copy)]
pub enum DocumentReference<'a> {
    /// Extracted text embedded in the system segment
    Inline(&'a ExtractedText),
    /// Uploaded file referenced by URI
    Handle(&'a UploadHandle),
}

impl DocumentReference<'_> {
    pub fn strategy(&self) -> SubmissionStrategy {
        match self {
            Self::Inline(_) => SubmissionStrategy::Inline,
            Self::Handle(_) => SubmissionStrategy::Handle,
        }
    }
}

/// One part of a content segment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl From<&GenerationConfig> for GenerationSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Structured request body: a system segment framing the document and a
/// user segment carrying the question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationSettings,
    #[serde(skip)]
    strategy: SubmissionStrategy,
}

impl Prompt {
    pub fn strategy(&self) -> SubmissionStrategy {
        self.strategy
    }

    /// Text of the system segment
    pub fn system_text(&self) -> String {
        collect_text(&self.system_instruction.parts)
    }

    /// Text parts of the user segment
    pub fn user_text(&self) -> String {
        self.contents
            .iter()
            .map(|c| collect_text(&c.parts))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// File URI referenced by the user segment, if any
    pub fn file_uri(&self) -> Option<&str> {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .find_map(|part| match part {
                Part::FileData { file_data } => Some(file_data.file_uri.as_str()),
                Part::Text { .. } => None,
            })
    }
}

fn collect_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            Part::FileData { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt builder for document questions
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    settings: GenerationSettings,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&GenerationConfig::default())
    }
}

impl PromptBuilder {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            settings: GenerationSettings::from(config),
        }
    }

    /// Build the prompt; identical inputs always give identical prompts
    pub fn build(&self, reference: DocumentReference<'_>, question: &str) -> Prompt {
        let (system, mut user_parts) = match reference {
            DocumentReference::Inline(text) => (
                format!(
                    "{}\n\nDOCUMENT:\n{}\n\nEND OF DOCUMENT",
                    GROUNDING_RULES,
                    text.as_str()
                ),
                Vec::new(),
            ),
            DocumentReference::Handle(handle) => (
                format!(
                    "{}\n\nThe document is attached to the user's message (Document URI: {}).",
                    GROUNDING_RULES, handle.uri
                ),
                vec![Part::FileData {
                    file_data: FileData {
                        mime_type: handle.mime_type.clone(),
                        file_uri: handle.uri.clone(),
                    },
                }],
            ),
        };

        user_parts.push(Part::Text {
            text: question.to_string(),
        });

        Prompt {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text { text: system }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: user_parts,
            }],
            generation_config: self.settings.clone(),
            strategy: reference.strategy(),
        }
    }
}
