// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Pieces:
// - registry: every URL ever discovered, each handed out at most once
// - extract: fetch one page and register the links it contains
// - coordinator: runs extractions in parallel until nothing new turns up
//
// Only pages on the start URL's host are expanded, but every link found is
// kept in the registry so documents hosted elsewhere can still be analyzed.
//
// Rust concepts:
// - Async programming: for concurrent network requests
// - Shared state behind a Mutex, wrapped in Arc for the spawned tasks
// =============================================================================

mod coordinator;
mod extract;
mod registry;

pub use coordinator::{Coordinator, CrawlSummary};
pub use registry::{canonicalize, UrlRegistry};
