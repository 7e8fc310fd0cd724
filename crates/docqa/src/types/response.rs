//! Answer, stage and outcome types

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::error::Error;

/// Answer text used when the service returned no candidate output
pub const NO_ANSWER: &str = "No answer found";

/// Raw body returned by the generation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse(String);

impl RawResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn body(&self) -> &str {
        &self.0
    }
}

/// Answer to one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Text of the first candidate
    Text(String),
    /// Well-formed response without any candidate output
    NotFound,
}

impl Answer {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::NotFound => NO_ANSWER,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Pipeline states, in the order a run enters them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    Start,
    Detected,
    Extracted,
    Submitted,
    Prompted,
    Requested,
    Parsed,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Detected => "Detected",
            Self::Extracted => "Extracted",
            Self::Submitted => "Submitted",
            Self::Prompted => "Prompted",
            Self::Requested => "Requested",
            Self::Parsed => "Parsed",
            Self::Done => "Done",
        }
    }

    /// Human-readable label for progress displays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Reading document",
            Self::Detected => "Detecting format",
            Self::Extracted => "Extracting text",
            Self::Submitted => "Submitting document",
            Self::Prompted => "Building prompt",
            Self::Requested => "Generating answer",
            Self::Parsed => "Reading answer",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress notification published when a run enters a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    /// Time since the run started
    #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Terminal result of one pipeline run
#[derive(Debug)]
pub enum Outcome {
    Done { answer: Answer },
    Failed { stage: Stage, error: Error },
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Done { answer } => Some(answer),
            Self::Failed { .. } => None,
        }
    }

    /// Failing stage and error, if the run failed
    pub fn failure(&self) -> Option<(Stage, &Error)> {
        match self {
            Self::Done { .. } => None,
            Self::Failed { stage, error } => Some((*stage, error)),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum OutcomeBody<'a> {
    Done {
        answer: &'a Answer,
    },
    Failed {
        stage: Stage,
        #[serde(rename = "errorKind")]
        error_kind: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<u16>,
    },
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            Self::Done { answer } => OutcomeBody::Done { answer },
            Self::Failed { stage, error } => OutcomeBody::Failed {
                stage: *stage,
                error_kind: error.kind(),
                message: error.to_string(),
                code: error.upstream_status(),
            },
        };
        body.serialize(serializer)
    }
}
