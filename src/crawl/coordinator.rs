// src/crawl/coordinator.rs
// =============================================================================
// The crawl coordinator: drains the registry with bounded parallelism until
// no more pages can be discovered.
//
// How it works:
// 1. Seed the registry with the start URL
// 2. Take the next unused URL from the registry
// 3. If it's http(s) on the start host, spawn an extraction task for it
//    (at most `concurrency` tasks run at once, enforced by a semaphore)
// 4. If nothing is left to take but tasks are still running, wait for one
//    of them to finish: it may have registered new links
// 5. Nothing left and nothing running: done
//
// Links to other hosts are still registered by the extractor; they are just
// never expanded here. They stay visible in registry.all() so documents
// hosted elsewhere can still be analyzed.
//
// Rust concepts:
// - tokio::sync::Semaphore: a pool of permits, one per running task
// - JoinSet: owns the spawned tasks so we can wait for "any one of them"
// - Arc: shared ownership of the registry and HTTP client across tasks
// =============================================================================

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use super::extract::extract_links;
use super::registry::UrlRegistry;
use crate::http::Fetcher;

/// Phase of the crawl loop, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// URLs are being handed out.
    Running,
    /// Nothing to hand out, but extractions are still in flight.
    Draining,
    /// Fixed point: no unused entries and no extractions in flight.
    Done,
}

/// Counters reported once the crawl reaches its fixed point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Entries in the registry when crawling stopped.
    pub discovered: usize,
    /// Pages an extraction task was spawned for.
    pub expanded: usize,
}

/// Drives link discovery from a single start URL.
pub struct Coordinator {
    start: Url,
    registry: Arc<UrlRegistry>,
    fetcher: Fetcher,
    concurrency: usize,
}

impl Coordinator {
    pub fn new(start: Url, registry: Arc<UrlRegistry>, fetcher: Fetcher, concurrency: usize) -> Self {
        Self {
            start,
            registry,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    // Runs the crawl loop until the registry reaches a fixed point
    //
    // Termination: every extraction only adds URLs that weren't in the
    // registry yet, and each URL is handed out once, so the loop ends after
    // every reachable same-host page has been expanded.
    pub async fn run(&self) -> CrawlSummary {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut state = CrawlState::Running;
        let mut expanded = 0;

        self.registry.add(&self.start);
        info!(start = %self.start, concurrency = self.concurrency, "crawl started");

        loop {
            // Reap finished tasks so the join set doesn't grow with the site
            while let Some(result) = tasks.try_join_next() {
                log_join_error(result);
            }

            if let Some(url) = self.registry.acquire_next() {
                state = self.transition(state, CrawlState::Running);

                if !self.should_expand(&url) {
                    debug!(url = %url, "not expanding off-site url");
                    continue;
                }

                // Waits here while `concurrency` extractions are in flight
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };

                let registry = Arc::clone(&self.registry);
                let fetcher = self.fetcher.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    extract_links(&fetcher, &url, &registry).await;
                });
                expanded += 1;
                continue;
            }

            if tasks.is_empty() {
                self.transition(state, CrawlState::Done);
                break;
            }

            state = self.transition(state, CrawlState::Draining);
            // Block until some extraction completes; it may have added links
            if let Some(result) = tasks.join_next().await {
                log_join_error(result);
            }
        }

        let (discovered, _) = self.registry.counts();
        info!(discovered, expanded, "crawl finished");
        CrawlSummary { discovered, expanded }
    }

    // Only http(s) URLs on exactly the start URL's host are crawled
    fn should_expand(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https") && url.host_str() == self.start.host_str()
    }

    fn transition(&self, from: CrawlState, to: CrawlState) -> CrawlState {
        if from != to {
            let (total, used) = self.registry.counts();
            debug!(?from, ?to, total, used, "crawl state changed");
        }
        to
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "extraction task failed");
    }
}
