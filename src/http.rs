// src/http.rs
// =============================================================================
// Shared HTTP plumbing for the crawl and analysis phases.
//
// Every request goes through a Fetcher, which bundles:
// - a reqwest Client with a fixed per-request timeout
// - a body size ceiling
//
// The body is read chunk by chunk so an oversized download is abandoned as
// soon as it crosses the ceiling instead of being buffered in full.
// Pages stay in memory; documents can be up to 100 MiB each, so they are
// spooled to an anonymous temp file instead.
//
// Rust concepts:
// - Clone on Client: cheap, it's an Arc around a connection pool
// - while let Some(chunk) = ...: loop until the stream is exhausted
// =============================================================================

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};
use url::Url;

use crate::error::FetchError;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An HTTP client with a per-request timeout and a body size ceiling.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_bytes: u64,
}

impl Fetcher {
    // Builds a fetcher with its own connection pool
    //
    // Parameters:
    //   timeout: applies to each request independently
    //   max_bytes: largest body we are willing to read
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, max_bytes })
    }

    /// Fetches an HTML page into memory. Any 2xx status is accepted.
    pub async fn fetch_page(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut response = self.send_checked(url, |status| status.is_success()).await?;

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            self.check_size(body.len() as u64 + chunk.len() as u64)?;
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    // Downloads a document into an anonymous temporary file
    //
    // Only 200 OK is accepted. The file is rewound to the start, and the OS
    // removes it once the returned handle is dropped.
    pub async fn fetch_document(&self, url: &Url) -> Result<std::fs::File, FetchError> {
        let mut response = self.send_checked(url, |status| status == StatusCode::OK).await?;

        let spool = tempfile::tempfile()?;
        let mut writer = BufWriter::new(File::from_std(spool));
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            self.check_size(written)?;
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        let mut file = writer.into_inner();
        file.rewind().await?;
        Ok(file.into_std().await)
    }

    // Sends the GET and rejects unwanted statuses and declared sizes
    async fn send_checked(
        &self,
        url: &Url,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<Response, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !accept(status) {
            return Err(FetchError::Status(status));
        }

        // Refuse early when the server tells us the size up front
        if let Some(declared) = response.content_length() {
            self.check_size(declared)?;
        }

        Ok(response)
    }

    fn check_size(&self, size: u64) -> Result<(), FetchError> {
        if size > self.max_bytes {
            return Err(FetchError::TooLarge { limit: self.max_bytes });
        }
        Ok(())
    }
}
