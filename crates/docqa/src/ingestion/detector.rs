//! Format detection

use crate::types::{Document, FormatKind};

/// Classifies documents into a [`FormatKind`]
///
/// Pure and total: every input maps to exactly one kind, and unknown
/// extensions map to `Unsupported` rather than an error.
pub struct FormatDetector;

impl FormatDetector {
    /// Detect by filename or path extension
    pub fn detect(filename: &str) -> FormatKind {
        FormatKind::from_filename(filename)
    }

    /// Detect by declared MIME type
    pub fn detect_mime(mime: &str) -> FormatKind {
        FormatKind::from_mime(mime)
    }

    /// Detect a loaded document, falling back to its MIME type when the name has no extension
    pub fn detect_document(document: &Document) -> FormatKind {
        let kind = document.format();
        tracing::debug!(
            "[{}] detected format: {}",
            document.display_name(),
            kind.display_name()
        );
        kind
    }
}
