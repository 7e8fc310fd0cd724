//! Single generation call with a hard deadline

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::generation::Prompt;
use crate::providers::GenerativeService;
use crate::types::{Credential, RawResponse};

/// Sends a prompt to the generation endpoint
#[derive(Clone)]
pub struct AnswerRequester {
    service: Arc<dyn GenerativeService>,
    timeout: Duration,
}

impl AnswerRequester {
    pub fn new(service: Arc<dyn GenerativeService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Issue exactly one call; no retries
    pub async fn request(&self, prompt: &Prompt, credential: &Credential) -> Result<RawResponse> {
        let start = Instant::now();

        let response = tokio::time::timeout(
            self.timeout,
            self.service.generate_content(prompt, credential),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "{} did not answer within {}s",
                self.service.name(),
                self.timeout.as_secs()
            ))
        })??;

        tracing::info!(
            "Generation with {} ({}) took {}ms",
            self.service.name(),
            self.service.model(),
            start.elapsed().as_millis()
        );
        Ok(response)
    }
}
