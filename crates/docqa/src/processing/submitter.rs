//! Document submission: inline text or an uploaded file polled until ready

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::SubmissionConfig;
use crate::error::{Error, Result};
use crate::generation::DocumentReference;
use crate::providers::{FileUpload, GenerativeService};
use crate::types::{
    Credential, Document, ExtractedText, FormatKind, ReadinessState, SubmissionStrategy,
    UploadHandle,
};

/// Document as the prompt will reference it
#[derive(Debug)]
pub enum Submission {
    Inline(ExtractedText),
    Uploaded {
        handle: UploadHandle,
        lease: UploadLease,
    },
}

impl Submission {
    pub fn reference(&self) -> DocumentReference<'_> {
        match self {
            Self::Inline(text) => DocumentReference::Inline(text),
            Self::Uploaded { handle, .. } => DocumentReference::Handle(handle),
        }
    }

    /// Remote file backing this submission, if one was uploaded
    pub fn uploaded(&self) -> Option<&UploadHandle> {
        match self {
            Self::Inline(_) => None,
            Self::Uploaded { handle, .. } => Some(handle),
        }
    }
}

/// Ownership of an uploaded file
///
/// Dropping an unreleased lease schedules the delete on the current runtime,
/// so a run that is aborted mid-flight still removes its upload.
pub struct UploadLease {
    service: Arc<dyn GenerativeService>,
    credential: Credential,
    name: String,
    armed: bool,
}

impl UploadLease {
    fn new(
        service: Arc<dyn GenerativeService>,
        credential: &Credential,
        name: &str,
        armed: bool,
    ) -> Self {
        Self {
            service,
            credential: credential.clone(),
            name: name.to_string(),
            armed,
        }
    }

    /// Delete the file now (when configured to) and disarm the lease
    pub async fn release(mut self) {
        if self.armed {
            delete_remote(self.service.as_ref(), &self.name, &self.credential).await;
            self.armed = false;
        }
    }
}

impl Drop for UploadLease {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime to delete {}; leaving it to expire", self.name);
            return;
        };

        tracing::debug!("Run ended before release; deleting {} in background", self.name);
        let service = self.service.clone();
        let credential = self.credential.clone();
        let name = std::mem::take(&mut self.name);
        runtime.spawn(async move {
            delete_remote(service.as_ref(), &name, &credential).await;
        });
    }
}

impl std::fmt::Debug for UploadLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadLease")
            .field("name", &self.name)
            .field("armed", &self.armed)
            .finish()
    }
}

async fn delete_remote(service: &dyn GenerativeService, name: &str, credential: &Credential) {
    match service.delete_file(name, credential).await {
        Ok(()) => tracing::debug!("Deleted {}", name),
        Err(e) => tracing::warn!("Failed to delete {}: {}", name, e),
    }
}

/// Hands the document to the service under the chosen strategy
#[derive(Clone)]
pub struct DocumentSubmitter {
    service: Arc<dyn GenerativeService>,
    poll_interval: Duration,
    max_poll_attempts: u32,
    delete_after_use: bool,
}

impl DocumentSubmitter {
    pub fn new(service: Arc<dyn GenerativeService>, config: &SubmissionConfig) -> Self {
        Self {
            service,
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
            delete_after_use: config.delete_after_use,
        }
    }

    /// Submit the document; with `Handle` this returns only once the upload is active
    pub async fn submit(
        &self,
        document: &Document,
        kind: FormatKind,
        text: ExtractedText,
        strategy: SubmissionStrategy,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Submission> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match strategy {
            SubmissionStrategy::Inline => Ok(Submission::Inline(text)),
            SubmissionStrategy::Handle => {
                let upload = upload_payload(document, kind, text);
                tracing::info!(
                    "Uploading '{}' ({}, {} bytes)",
                    upload.display_name,
                    upload.mime_type,
                    upload.data.len()
                );

                let handle = self
                    .service
                    .upload_file(upload, credential)
                    .await
                    .map_err(into_transport)?;

                let lease = UploadLease::new(
                    self.service.clone(),
                    credential,
                    &handle.name,
                    self.delete_after_use,
                );

                match self.wait_until_active(handle, credential, cancel).await {
                    Ok(handle) => Ok(Submission::Uploaded { handle, lease }),
                    Err(e) => {
                        lease.release().await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Poll until the handle leaves `Pending`, bounded by the attempt limit
    async fn wait_until_active(
        &self,
        mut handle: UploadHandle,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<UploadHandle> {
        let mut attempts = 0u32;

        loop {
            match handle.state {
                ReadinessState::Active => return Ok(handle),
                ReadinessState::Failed => {
                    return Err(Error::UploadRejected(handle.error.unwrap_or_else(|| {
                        format!("{} failed processing", handle.name)
                    })));
                }
                ReadinessState::Pending if attempts >= self.max_poll_attempts => {
                    tracing::warn!("{} still pending after {} checks", handle.name, attempts);
                    return Err(Error::UploadTimeout { attempts });
                }
                ReadinessState::Pending => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            attempts += 1;
            handle = self
                .service
                .get_file(&handle.name, credential)
                .await
                .map_err(into_transport)?;
            tracing::debug!(
                "Readiness check {}/{} for {}: {:?}",
                attempts,
                self.max_poll_attempts,
                handle.name,
                handle.state
            );

            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
    }

    /// Delete the remote copy backing a submission, if configured to
    pub async fn release(&self, submission: Submission) {
        if let Submission::Uploaded { lease, .. } = submission {
            lease.release().await;
        }
    }
}

/// PDFs go up as-is; everything else as its extracted text
fn upload_payload(document: &Document, kind: FormatKind, text: ExtractedText) -> FileUpload {
    let display_name = document.display_name().to_string();
    match kind {
        FormatKind::Pdf => FileUpload {
            display_name,
            mime_type: kind.mime_type().to_string(),
            data: document.data().clone(),
        },
        FormatKind::Markdown => FileUpload {
            display_name,
            mime_type: "text/markdown".to_string(),
            data: text.into_string().into(),
        },
        _ => FileUpload {
            display_name,
            mime_type: "text/plain".to_string(),
            data: text.into_string().into(),
        },
    }
}

/// Every failure of the upload/status path surfaces as a transport error
fn into_transport(err: Error) -> Error {
    match err {
        Error::Transport(_) | Error::Cancelled => err,
        other => Error::Transport(other.to_string()),
    }
}
