//! Document ingestion: format detection and text extraction

pub mod detector;
pub mod extractor;

pub use detector::FormatDetector;
pub use extractor::TextExtractor;
