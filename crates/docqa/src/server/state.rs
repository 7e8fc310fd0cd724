//! Application state for the docqa server

use std::sync::Arc;

use crate::config::DocQaConfig;
use crate::error::Result;
use crate::processing::Pipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DocQaConfig,
    pipeline: Pipeline,
}

impl AppState {
    /// Create state backed by the Gemini client
    pub fn new(config: DocQaConfig) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config)?;
        tracing::info!(
            "Pipeline ready: {} ({}), default strategy {}",
            pipeline.service_name(),
            pipeline.model(),
            pipeline.default_strategy()
        );
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an existing pipeline
    pub fn with_pipeline(config: DocQaConfig, pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    pub fn config(&self) -> &DocQaConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }
}
