// src/crawl/extract.rs
// =============================================================================
// The link extractor: fetch one page, pull out every <a href>, resolve it
// against the page URL and hand it to the registry.
//
// This is best-effort discovery:
// - A page that fails to load (timeout, non-2xx, too large) adds nothing
// - A malformed href is skipped on its own, the rest of the page still counts
// - Off-host and non-HTTP links are registered too; deciding what to crawl
//   is the coordinator's job, and off-host documents still get analyzed
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Tolerates broken markup the way browsers do (it's built on html5ever)
// =============================================================================

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::registry::UrlRegistry;
use crate::http::Fetcher;

// Fetches a page and registers every link found on it
//
// Parameters:
//   fetcher: shared HTTP client for the crawl phase
//   page_url: the page to fetch
//   registry: where discovered links go
//
// Returns: how many of the page's links were new to the registry
pub async fn extract_links(fetcher: &Fetcher, page_url: &Url, registry: &UrlRegistry) -> usize {
    let body = match fetcher.fetch_page(page_url).await {
        Ok(body) => body,
        Err(e) => {
            debug!(url = %page_url, error = %e, "skipping page");
            return 0;
        }
    };

    // Building the DOM of a large page is CPU work; keep it off the runtime
    let base = page_url.clone();
    let parsed = tokio::task::spawn_blocking(move || {
        let html = String::from_utf8_lossy(&body);
        parse_links(&html, &base)
    })
    .await;
    let links = match parsed {
        Ok(links) => links,
        Err(e) => {
            debug!(url = %page_url, error = %e, "link parser failed");
            return 0;
        }
    };
    let found = links.len();
    let added = links.iter().filter(|link| registry.add(link)).count();

    debug!(url = %page_url, found, added, "page harvested");
    added
}

// Extracts and resolves all anchor hrefs in an HTML document
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   base = "https://example.com/page"
//   result = ["https://example.com/docs"]
pub fn parse_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    // "a[href]" is a constant, so this only fails if scraper itself breaks
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .collect()
}

// Resolves a possibly-relative href against the page it appeared on
//
// Examples (base = "https://example.com/page"):
//   "documents/doc.pdf"         -> "https://example.com/documents/doc.pdf"
//   "/doc.pdf"                  -> "https://example.com/doc.pdf"
//   "?page=2"                   -> "https://example.com/page?page=2"
//   "https://other.com/x"       -> "https://other.com/x" (unchanged)
//   "http://[bad"               -> None
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Url::join handles absolute hrefs too: they simply replace the base
    base.join(href).ok()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why String::from_utf8_lossy?
//    - Pages aren't guaranteed to be valid UTF-8
//    - Invalid bytes become U+FFFD instead of failing the whole page
//    - It returns a Cow, so valid UTF-8 isn't even copied
//
// 2. Why is parse_links a separate, non-async function?
//    - scraper's Html type can't be sent between threads
//    - spawn_blocking runs it on a blocking-pool thread; only the Vec<Url>
//      it returns crosses back, so the extraction future stays Send
//
// 3. What does let-else do?
//    - let Ok(x) = expr else { ... } binds x on success
//    - The else block must leave the function (return, continue, panic...)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Fetcher;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn fetcher() -> Fetcher {
        Fetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve_link(&base("https://example.com/page"), "documents/doc.pdf").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/documents/doc.pdf");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let resolved = resolve_link(&base("https://example.com/page/sub"), "/doc.pdf").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/doc.pdf");
    }

    #[test]
    fn test_resolve_query_only_link() {
        let resolved =
            resolve_link(&base("https://example.com/page"), "document?format=pdf&id=123").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/document?format=pdf&id=123");

        let resolved = resolve_link(&base("https://example.com/list"), "?page=2").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/list?page=2");
    }

    #[test]
    fn test_absolute_link_unchanged() {
        let resolved = resolve_link(&base("https://example.com/page"), "https://example.org/another").unwrap();
        assert_eq!(resolved.as_str(), "https://example.org/another");
    }

    #[test]
    fn test_malformed_href_is_skipped() {
        assert!(resolve_link(&base("https://example.com/"), "http://[::1").is_none());

        let html = r#"
            <a href="http://[::1">broken</a>
            <a href="/ok.pdf">fine</a>
        "#;
        let links = parse_links(html, &base("https://example.com/"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/ok.pdf");
    }

    #[test]
    fn test_non_http_links_are_kept() {
        let html = r#"
            <a href="mailto:someone@example.com">mail</a>
            <a href="ftp://files.example.com/a.pdf">ftp</a>
            <a name="no-href">anchor</a>
        "#;
        let links = parse_links(html, &base("https://example.com/"));
        let schemes: Vec<_> = links.iter().map(|u| u.scheme().to_string()).collect();
        assert_eq!(schemes, vec!["mailto", "ftp"]);
    }

    #[tokio::test]
    async fn test_extract_links_registers_all_resolved_urls() {
        let server = MockServer::start().await;
        let html = r#"
            <html><body>
                <a href="/a.html">A</a>
                <a href="docs/report.pdf">Report</a>
                <a href="https://elsewhere.org/b.pdf">Elsewhere</a>
                <a href="/a.html#top">A again</a>
            </body></html>
        "#;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let page = Url::parse(&format!("{}/index.html", server.uri())).unwrap();
        let registry = UrlRegistry::new();
        let added = extract_links(&fetcher(), &page, &registry).await;

        assert_eq!(added, 3);
        let root = server.uri();
        assert!(registry.status(&Url::parse(&format!("{root}/a.html")).unwrap()).0);
        assert!(registry.status(&Url::parse(&format!("{root}/docs/report.pdf")).unwrap()).0);
        assert!(registry.status(&Url::parse("https://elsewhere.org/b.pdf").unwrap()).0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_extract_links_on_single_threaded_runtime() {
        let server = MockServer::start().await;
        let links: String = (0..500).map(|i| format!(r#"<a href="/p{i}.html">p</a>"#)).collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(links))
            .mount(&server)
            .await;

        let page = Url::parse(&format!("{}/", server.uri())).unwrap();
        let registry = UrlRegistry::new();

        assert_eq!(extract_links(&fetcher(), &page, &registry).await, 500);
    }

    #[tokio::test]
    async fn test_failed_page_adds_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"<a href="/x">x</a>"#))
            .mount(&server)
            .await;

        let page = Url::parse(&format!("{}/broken", server.uri())).unwrap();
        let registry = UrlRegistry::new();

        assert_eq!(extract_links(&fetcher(), &page, &registry).await, 0);
        assert_eq!(registry.counts(), (0, 0));
    }
}
