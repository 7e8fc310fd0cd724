//! Question-answering pipeline
//!
//! Drives one question through
//! `Start → Detected → Extracted → Submitted → Prompted → Requested → Parsed → Done`,
//! stopping at the first failing stage.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DocQaConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerRequester, PromptBuilder, ResponseParser};
use crate::ingestion::{FormatDetector, TextExtractor};
use crate::providers::{GeminiClient, GenerativeService};
use crate::types::{
    Answer, AskRequest, Document, ExtractedText, FormatKind, Outcome, Stage, StageEvent,
    SubmissionStrategy,
};

use super::submitter::DocumentSubmitter;

/// An error together with the stage that produced it
struct StageFailure {
    stage: Stage,
    error: Error,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

/// Publishes stage-entry events; a dropped receiver is ignored
struct Progress {
    events: Option<UnboundedSender<StageEvent>>,
    started: Instant,
}

impl Progress {
    fn new(events: Option<UnboundedSender<StageEvent>>) -> Self {
        Self {
            events,
            started: Instant::now(),
        }
    }

    fn enter(&self, stage: Stage) {
        let elapsed = self.started.elapsed();
        tracing::info!("{} ({}ms)", stage.label(), elapsed.as_millis());
        if let Some(events) = &self.events {
            let _ = events.send(StageEvent { stage, elapsed });
        }
    }
}

/// Runs questions against documents
#[derive(Clone)]
pub struct Pipeline {
    service: Arc<dyn GenerativeService>,
    extractor: TextExtractor,
    submitter: DocumentSubmitter,
    prompts: PromptBuilder,
    requester: AnswerRequester,
    default_strategy: SubmissionStrategy,
}

impl Pipeline {
    /// Create a pipeline on top of any generative service
    pub fn new(config: &DocQaConfig, service: Arc<dyn GenerativeService>) -> Self {
        Self {
            extractor: TextExtractor::new(config.document.pdf_timeout()),
            submitter: DocumentSubmitter::new(service.clone(), &config.submission),
            prompts: PromptBuilder::new(&config.generation),
            requester: AnswerRequester::new(service.clone(), config.service.request_timeout()),
            default_strategy: config.submission.strategy,
            service,
        }
    }

    /// Create a pipeline talking to Gemini
    pub fn from_config(config: &DocQaConfig) -> Result<Self> {
        let client = GeminiClient::new(&config.service)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn model(&self) -> &str {
        self.service.model()
    }

    pub fn default_strategy(&self) -> SubmissionStrategy {
        self.default_strategy
    }

    /// Answer one question
    ///
    /// Never panics or returns early with an error: every failure is
    /// reported as `Outcome::Failed` with the stage it happened in.
    pub async fn run(
        &self,
        request: AskRequest,
        events: Option<UnboundedSender<StageEvent>>,
        cancel: CancellationToken,
    ) -> Outcome {
        let span = tracing::info_span!(
            "ask",
            run = %Uuid::new_v4(),
            document = %request.source.describe()
        );

        async move {
            let progress = Progress::new(events);
            match self.execute(request, &progress, &cancel).await {
                Ok(answer) => {
                    progress.enter(Stage::Done);
                    Outcome::Done { answer }
                }
                Err(StageFailure { stage, error }) => {
                    tracing::warn!("Failed at {}: {} ({})", stage, error, error.kind());
                    Outcome::Failed { stage, error }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: AskRequest,
        progress: &Progress,
        cancel: &CancellationToken,
    ) -> std::result::Result<Answer, StageFailure> {
        let AskRequest {
            source,
            question,
            credential,
            strategy,
        } = request;

        progress.enter(Stage::Start);
        let credential = credential.ok_or(Error::MissingCredential).at(Stage::Start)?;
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion).at(Stage::Start);
        }
        let document = source.load().await.at(Stage::Start)?;

        let kind = FormatDetector::detect_document(&document);
        if !kind.is_supported() {
            return Err(Error::UnsupportedFormat(document.filename().to_string()))
                .at(Stage::Detected);
        }
        progress.enter(Stage::Detected);

        let text = self.extract(&document, kind).await.at(Stage::Extracted)?;
        tracing::debug!("Extracted {} chars from {}", text.len(), document.filename());
        progress.enter(Stage::Extracted);

        let strategy = strategy.unwrap_or(self.default_strategy);
        let submission = self
            .submitter
            .submit(&document, kind, text, strategy, &credential, cancel)
            .await
            .at(Stage::Submitted)?;
        drop(document);
        progress.enter(Stage::Submitted);

        let prompt = self.prompts.build(submission.reference(), &question);
        progress.enter(Stage::Prompted);

        let response = tokio::select! {
            response = self.requester.request(&prompt, &credential) => response,
            _ = cancel.cancelled() => Err(Error::Cancelled),
        };
        self.submitter.release(submission).await;
        let response = response.at(Stage::Requested)?;
        progress.enter(Stage::Requested);

        let answer = ResponseParser::parse(&response).at(Stage::Parsed)?;
        progress.enter(Stage::Parsed);

        Ok(answer)
    }

    /// Run the CPU-bound extraction off the async workers
    async fn extract(&self, document: &Document, kind: FormatKind) -> Result<ExtractedText> {
        let extractor = self.extractor;
        let document = document.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&document, kind))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?
    }
}
