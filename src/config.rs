// src/config.rs
// =============================================================================
// Validated run configuration.
//
// The CLI hands us raw strings and numbers. CrawlConfig::from_cli turns them
// into typed values and performs every check that can fail, so once a
// CrawlConfig exists the run cannot hit a configuration error anymore, and
// no request has been sent yet.
//
// Rust concepts:
// - Result with a custom error enum (ConfigError) instead of panicking
// - collect() into Result<Vec<_>, _>: stops at the first invalid token
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::analyzer::DocumentType;
use crate::cli::Cli;
use crate::crawl::canonicalize;
use crate::error::ConfigError;

/// Largest HTML page the extractor will read.
pub const DEFAULT_PAGE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Largest document an analyzer will download.
pub const DEFAULT_DOCUMENT_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Where the JSON result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    File(PathBuf),
}

/// Everything a run needs, already validated.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start: Url,
    pub types: Vec<DocumentType>,
    pub concurrency: usize,
    pub output: OutputSink,
    pub page_timeout: Duration,
    pub document_timeout: Duration,
    pub page_max_bytes: u64,
    pub document_max_bytes: u64,
}

impl CrawlConfig {
    // Builds the configuration from parsed command-line arguments
    //
    // Fails on:
    // - a start URL that doesn't parse or isn't http(s)
    // - an unknown document type token
    // - a concurrency ceiling of zero, or one too large for a semaphore
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let start = parse_start_url(&cli.site)?;
        let types = parse_types(&cli.types)?;

        if cli.paramax == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        // Each phase builds a semaphore with this many permits
        if cli.paramax > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ConcurrencyTooLarge {
                requested: cli.paramax,
                max: Semaphore::MAX_PERMITS,
            });
        }

        let output = match &cli.output {
            Some(path) => OutputSink::File(path.clone()),
            None => OutputSink::Stdout,
        };

        Ok(Self {
            start,
            types,
            concurrency: cli.paramax,
            output,
            page_timeout: Duration::from_secs(cli.page_timeout),
            document_timeout: Duration::from_secs(cli.document_timeout),
            page_max_bytes: DEFAULT_PAGE_MAX_BYTES,
            document_max_bytes: DEFAULT_DOCUMENT_MAX_BYTES,
        })
    }
}

fn parse_start_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidStartUrl {
        url: raw.to_string(),
        source,
    })?;

    // http(s) URLs always carry a non-empty host once parsed
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }

    Ok(canonicalize(&url))
}

// No tokens means every registered type. Duplicates are dropped, keeping the
// first occurrence so the requested priority order survives.
fn parse_types(tokens: &[String]) -> Result<Vec<DocumentType>, ConfigError> {
    if tokens.is_empty() {
        return Ok(DocumentType::ALL.to_vec());
    }

    let parsed = tokens
        .iter()
        .map(|token| token.trim().parse::<DocumentType>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut types = Vec::with_capacity(parsed.len());
    for doc_type in parsed {
        if !types.contains(&doc_type) {
            types.push(doc_type);
        }
    }
    Ok(types)
}
