// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Note that document type tokens are accepted as plain strings here and
// validated later in config.rs, so an unknown token becomes a proper
// ConfigError instead of a clap usage message.
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "docs-crawler",
    version,
    about = "Crawl a website and extract metadata from the documents it links to",
    long_about = "docs-crawler walks every page reachable on a single host, collects all linked URLs \
                  and analyzes the PDF and Office Open XML documents among them. Results are written \
                  as a JSON array."
)]
pub struct Cli {
    /// Start URL of the site to crawl (e.g., https://example.com)
    #[arg(short, long)]
    pub site: String,

    /// Document type / file name extension: pdf, docx, xlsx or pptx (all if empty)
    ///
    /// Can be repeated: -t pdf -t docx
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub types: Vec<String>,

    /// Output file (stdout if none)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of parallel crawl and analysis tasks
    #[arg(short, long, default_value_t = 100)]
    pub paramax: usize,

    /// Timeout in seconds for fetching a single HTML page
    #[arg(long, default_value_t = 10)]
    pub page_timeout: u64,

    /// Timeout in seconds for downloading a single document
    #[arg(long, default_value_t = 30)]
    pub document_timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["docs-crawler", "--site", "https://example.com"]).unwrap();
        assert_eq!(cli.site, "https://example.com");
        assert!(cli.types.is_empty());
        assert!(cli.output.is_none());
        assert_eq!(cli.paramax, 100);
        assert_eq!(cli.page_timeout, 10);
        assert_eq!(cli.document_timeout, 30);
    }

    #[test]
    fn test_parse_repeated_types() {
        let cli = Cli::try_parse_from([
            "docs-crawler", "-s", "https://example.com", "-t", "pdf", "-t", "docx", "-p", "4",
            "-o", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.types, vec!["pdf", "docx"]);
        assert_eq!(cli.paramax, 4);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_site_is_required() {
        assert!(Cli::try_parse_from(["docs-crawler", "-t", "pdf"]).is_err());
    }
}
