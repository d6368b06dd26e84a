// src/analyzer/mod.rs
// =============================================================================
// Document analyzers: one per file format, all behind the Analyzer trait.
//
// Submodules:
// - pdf: PDF Info dictionary (title, author, dates, ...)
// - ooxml: Office Open XML core/app properties (docx, xlsx, pptx)
// - dispatch: runs the right analyzer for every discovered URL
//
// The set of document types is fixed at compile time. DocumentType maps an
// extension token to the analyzer that handles it, so adding a format means
// adding a variant and a match arm.
// =============================================================================

mod dispatch;
mod ooxml;
mod pdf;

#[cfg(test)]
pub(crate) mod fixtures;

pub use dispatch::{analyze_all, DocumentResults};
pub use ooxml::OoxmlAnalyzer;
pub use pdf::PdfAnalyzer;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{AnalyzeError, ConfigError};
use crate::http::Fetcher;

/// Fetches one document and extracts format-specific metadata from it.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Downloads and analyzes the document at `url`, keeping the metadata.
    async fn process(&mut self, url: &Url) -> Result<(), AnalyzeError>;

    /// Renders the extracted metadata as a JSON object. Fields that were
    /// never populated are left out.
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;
}

/// A document format we know how to analyze, named by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
}

impl DocumentType {
    /// Every registered type, used when the user doesn't ask for any.
    pub const ALL: [DocumentType; 4] = [Self::Pdf, Self::Docx, Self::Xlsx, Self::Pptx];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
        }
    }

    /// True when `url` ends with ".<extension>".
    ///
    /// The check runs on the full canonical string, so a query after the
    /// file name ("report.pdf?download=1") does not match.
    pub fn matches(self, url: &str) -> bool {
        url.strip_suffix(self.extension())
            .is_some_and(|rest| rest.ends_with('.'))
    }

    /// Creates a fresh analyzer for this type.
    pub fn new_analyzer(self, fetcher: Fetcher) -> Box<dyn Analyzer> {
        match self {
            Self::Pdf => Box::new(PdfAnalyzer::new(fetcher)),
            Self::Docx | Self::Xlsx | Self::Pptx => Box::new(OoxmlAnalyzer::new(fetcher)),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentType {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.extension() == token)
            .ok_or_else(|| ConfigError::UnknownDocumentType(token.to_string()))
    }
}

// Runs a document parser on tokio's blocking thread pool
//
// lopdf, zip and quick-xml are synchronous and CPU-bound, so they never run
// on a runtime worker thread. A panic inside the parser becomes
// AnalyzeError::Task.
pub(crate) async fn parse_blocking<T, F>(parse: F) -> Result<T, AnalyzeError>
where
    F: FnOnce() -> Result<T, AnalyzeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(parse).await?
}

/// Returns the first requested type whose extension ends `url`.
pub fn match_type(types: &[DocumentType], url: &str) -> Option<DocumentType> {
    types.iter().copied().find(|t| t.matches(url))
}

// Returns the last path segment of a URL, if it has one
//
// Example: "https://example.com/files/report.pdf" -> Some("report.pdf")
pub(crate) fn file_name(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
