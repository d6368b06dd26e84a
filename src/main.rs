// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Validate them into a CrawlConfig (no network activity before this passes)
// 3. Crawl: discover every URL reachable on the start host
// 4. Analyze: run the matching analyzer for every document-like URL
// 5. Write the JSON array and exit (0 = completed, 2 = error)
//
// Rust concepts used:
// - async/await: because we need to make many network requests concurrently
// - Result<T, E>: for error handling (T = success type, E = error type)
// - Arc: the registry is shared between the coordinator and its tasks
// =============================================================================

// Module declarations - tells Rust about our other source files
mod analyzer;      // src/analyzer/ - document metadata extraction
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - validated run configuration
mod crawl;         // src/crawl/ - website crawling logic
mod error;         // src/error.rs - error types
mod http;          // src/http.rs - size-capped HTTP fetching
mod output;        // src/output.rs - JSON result emitter

use anyhow::{Context, Result};
use clap::Parser;  // Parser trait enables the parse() method
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use analyzer::DocumentResults;
use cli::Cli;
use config::CrawlConfig;
use crawl::{Coordinator, UrlRegistry};
use http::Fetcher;

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Print the whole cause chain, e.g. "cannot create output file ...: No such file"
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = run completed (even if no document could be analyzed)
//   Err = configuration or output error, reported with exit code 2
async fn run() -> Result<i32> {
    // Parse first so --help works without any log setup
    let cli = Cli::parse();
    init_logging(&cli);
    debug!(?cli, "CLI arguments parsed");

    let config = CrawlConfig::from_cli(&cli)?;

    let (urls, results) = crawl_and_analyze(&config).await?;
    output::emit(&config.output, &urls, &results)?;

    Ok(0)
}

// Logs go to stderr so stdout stays pure JSON
// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Runs both phases back to back
//
// Returns: the registry snapshot (which fixes the output order) and the
// documents that were analyzed successfully
async fn crawl_and_analyze(config: &CrawlConfig) -> Result<(Vec<Url>, DocumentResults)> {
    let page_fetcher = Fetcher::new(config.page_timeout, config.page_max_bytes)
        .context("failed to build HTTP client for pages")?;
    let document_fetcher = Fetcher::new(config.document_timeout, config.document_max_bytes)
        .context("failed to build HTTP client for documents")?;

    let registry = Arc::new(UrlRegistry::new());
    let coordinator = Coordinator::new(
        config.start.clone(),
        Arc::clone(&registry),
        page_fetcher,
        config.concurrency,
    );
    let summary = coordinator.run().await;

    let urls = registry.all();
    info!(
        discovered = summary.discovered,
        expanded = summary.expanded,
        types = ?config.types,
        "crawl phase complete"
    );

    let results = analyzer::analyze_all(urls.clone(), &config.types, &document_fetcher, config.concurrency).await;
    if results.is_empty() {
        info!("no document could be analyzed; output will be an empty array");
    }

    Ok((urls, results))
}
