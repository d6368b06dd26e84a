// src/analyzer/dispatch.rs
// =============================================================================
// Analyzer dispatch: after crawling, run the matching analyzer once for every
// discovered URL that looks like a requested document type.
//
// Key points:
// - At most `concurrency` analyses run at once (fresh semaphore, independent
//   of the crawl phase)
// - Each analysis gets its own analyzer instance; nothing is shared while
//   downloading and parsing
// - Only the final insert into the result map takes the lock, so slow
//   downloads never wait on each other
// - A failed analysis is dropped: no retry, no entry in the results
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use super::{match_type, Analyzer, DocumentType};
use crate::http::Fetcher;

/// Successfully analyzed documents, keyed by canonical URL.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Clone, Default)]
pub struct DocumentResults {
    inner: Arc<Mutex<HashMap<String, Box<dyn Analyzer>>>>,
}

impl DocumentResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, url: &Url, analyzer: Box<dyn Analyzer>) {
        self.inner.lock().insert(url.to_string(), analyzer);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, url: &Url) -> bool {
        self.inner.lock().contains_key(url.as_str())
    }

    /// JSON for one recorded document, or `None` if `url` has no result.
    pub fn to_json(&self, url: &Url) -> Option<Result<Vec<u8>, serde_json::Error>> {
        self.inner.lock().get(url.as_str()).map(|analyzer| analyzer.to_json())
    }
}

// Analyzes every URL that matches one of the requested document types
//
// Parameters:
//   urls: snapshot of everything the crawl discovered
//   types: requested document types, in priority order
//   fetcher: HTTP client for document downloads
//   concurrency: maximum number of analyses in flight
//
// Returns: the documents that were analyzed successfully
pub async fn analyze_all(
    urls: Vec<Url>,
    types: &[DocumentType],
    fetcher: &Fetcher,
    concurrency: usize,
) -> DocumentResults {
    let results = DocumentResults::new();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut dispatched = 0usize;

    info!(candidates = urls.len(), "analysis started");

    for url in urls {
        let Some(doc_type) = match_type(types, url.as_str()) else {
            continue;
        };

        while let Some(result) = tasks.try_join_next() {
            log_join_error(result);
        }

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        let fetcher = fetcher.clone();
        let results = results.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let mut analyzer = doc_type.new_analyzer(fetcher);
            match analyzer.process(&url).await {
                Ok(()) => {
                    debug!(url = %url, %doc_type, "document analyzed");
                    results.record(&url, analyzer);
                }
                Err(e) => debug!(url = %url, %doc_type, error = %e, "dropping document"),
            }
        });
        dispatched += 1;
    }

    while let Some(result) = tasks.join_next().await {
        log_join_error(result);
    }

    info!(dispatched, analyzed = results.len(), "analysis finished");
    results
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "analysis task failed");
    }
}
