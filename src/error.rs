// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Only two kinds of error ever reach the user:
// - ConfigError: bad command-line input, reported before any network activity
// - OutputError: the JSON result could not be written
//
// FetchError and AnalyzeError are recovered locally: a page that fails to
// load contributes zero links, a document that fails to analyze is simply
// left out of the output.
//
// Rust concepts:
// - thiserror: derive macro that implements Display and Error for enums
// - #[from]: lets the ? operator convert a source error automatically
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Invalid run configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid start URL '{url}': {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("start URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("unknown document format for analysis: '{0}' (expected one of pdf, docx, xlsx, pptx)")]
    UnknownDocumentType(String),

    #[error("concurrency must be a positive integer")]
    ZeroConcurrency,

    #[error("concurrency {requested} exceeds the maximum of {max}")]
    ConcurrencyTooLarge { requested: usize, max: usize },
}

/// A single HTTP fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("body exceeds maximum allowed size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("cannot spool body to disk: {0}")]
    Spool(#[from] std::io::Error),
}

/// A document could not be analyzed.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("invalid Office archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid XML part: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The result sink could not be written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create output file '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}
