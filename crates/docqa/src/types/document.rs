//! Document, format and extracted-text types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// MIME type of `.xlsx` workbooks
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Closed set of document kinds the pipeline knows how to read
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// UTF-8 text file
    PlainText,
    /// Markdown source, read verbatim like plain text
    Markdown,
    /// PDF document
    Pdf,
    /// Excel workbook (.xlsx)
    Spreadsheet,
    /// Anything else
    Unsupported,
}

impl FormatKind {
    /// Detect the format from a filename or path, using its lowercased extension
    pub fn from_filename(filename: &str) -> Self {
        match extension_of(filename).as_deref() {
            Some("txt") | Some("md") => Self::PlainText,
            Some("pdf") => Self::Pdf,
            Some("xlsx") => Self::Spreadsheet,
            _ => Self::Unsupported,
        }
    }

    /// Detect the format from a declared MIME type
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "text/plain" => Self::PlainText,
            "text/markdown" | "text/x-markdown" => Self::Markdown,
            "application/pdf" => Self::Pdf,
            XLSX_MIME => Self::Spreadsheet,
            _ => Self::Unsupported,
        }
    }

    /// Check if text can be extracted from this format
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// MIME type used when this kind is sent to the service
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Pdf => "application/pdf",
            Self::Spreadsheet => XLSX_MIME,
            Self::Unsupported => "application/octet-stream",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PlainText => "Text File",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
            Self::Spreadsheet => "Excel Spreadsheet (.xlsx)",
            Self::Unsupported => "Unsupported",
        }
    }
}

/// Lowercased extension of the last path component, if it has one
fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// A document supplied for one question
///
/// Immutable once read; dropped when the pipeline run that owns it ends.
#[derive(Debug, Clone)]
pub struct Document {
    data: Bytes,
    filename: String,
    mime_type: Option<String>,
}

impl Document {
    /// Create a document from in-memory bytes
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            mime_type: None,
        }
    }

    /// Attach a declared MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Read a document from the local filesystem
    pub async fn from_path(path: impl AsRef<Path>, mime_type: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime_type = mime_type
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(path).first().map(|m| m.to_string()));

        Ok(Self {
            data: Bytes::from(data),
            filename: path.to_string_lossy().to_string(),
            mime_type,
        })
    }

    /// Raw bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Declared filename or path
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Final path component of the filename, used as the upload display name
    pub fn display_name(&self) -> &str {
        self.filename
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.filename)
    }

    /// Declared MIME type, if any
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the document has no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Detect this document's format
    ///
    /// The filename extension decides; the declared MIME type is only
    /// consulted when the filename carries no extension at all.
    pub fn format(&self) -> FormatKind {
        if extension_of(&self.filename).is_none() {
            if let Some(mime) = &self.mime_type {
                return FormatKind::from_mime(mime);
            }
        }
        FormatKind::from_filename(&self.filename)
    }
}

/// Where the pipeline gets its document from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Bytes handed over by the front-end
    Upload(Document),
    /// A fixed document on the local filesystem
    Path {
        path: PathBuf,
        mime_type: Option<String>,
    },
}

impl DocumentSource {
    /// Materialize the document
    pub async fn load(self) -> Result<Document> {
        match self {
            Self::Upload(document) => Ok(document),
            Self::Path { path, mime_type } => {
                Document::from_path(&path, mime_type.as_deref()).await
            }
        }
    }

    /// Name used in logs before the document is loaded
    pub fn describe(&self) -> String {
        match self {
            Self::Upload(document) => document.filename().to_string(),
            Self::Path { path, .. } => path.display().to_string(),
        }
    }
}

/// Normalized text content of a document
///
/// Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Wrap extracted text, rejecting whitespace-only content
    pub fn new(filename: &str, text: String) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::EmptyDocument(filename.to_string()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
