//! Answer extraction from generateContent responses

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{Answer, RawResponse};

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    /// Chat-completion style bodies
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    /// Older text-generation responses
    #[serde(default)]
    output: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Candidate {
    fn text(self) -> Option<String> {
        let from_parts = self.content.map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        });
        from_parts.filter(|t| !t.trim().is_empty()).or(self.output)
    }
}

impl Choice {
    fn text(self) -> Option<String> {
        self.message.and_then(|m| m.content).or(self.text)
    }
}

/// Pulls the answer text out of a raw response body
pub struct ResponseParser;

impl ResponseParser {
    /// Parse the first candidate's text
    ///
    /// A well-formed body with no candidates or blank text yields
    /// `Answer::NotFound`; a body that is not a JSON object is malformed.
    pub fn parse(raw: &RawResponse) -> Result<Answer> {
        let response: GenerateResponse = serde_json::from_str(raw.body())
            .map_err(|e| Error::malformed(format!("Unexpected response body: {}", e)))?;

        let text = match (response.candidates, response.choices) {
            (Some(candidates), _) if !candidates.is_empty() => {
                candidates.into_iter().next().and_then(Candidate::text)
            }
            (_, Some(choices)) => choices.into_iter().next().and_then(Choice::text),
            _ => None,
        };

        match text {
            Some(text) if !text.trim().is_empty() => Ok(Answer::Text(text)),
            _ => {
                tracing::debug!("Response carried no answer text");
                Ok(Answer::NotFound)
            }
        }
    }
}
