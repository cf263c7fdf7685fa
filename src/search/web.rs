//! HTTP page fetcher backed by a public web search endpoint.
//!
//! Each query is URL-encoded and appended to the configured endpoint
//! (Google search by default). Requests carry a browser-like User-Agent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::PageFetcher;
use crate::config::SearchConfig;

pub struct SearchPageFetcher {
    http: Client,
    endpoint: String,
}

impl SearchPageFetcher {
    pub fn new(cfg: &SearchConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to build search HTTP client")?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }

    /// Full request URL for a query.
    fn url_for(&self, query: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(query))
    }
}

#[async_trait]
impl PageFetcher for SearchPageFetcher {
    async fn fetch(&self, query: &str) -> Result<String> {
        let url = self.url_for(query);
        debug!(%url, "Fetching search page");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Search request failed for {query:?}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status} for {query:?}");
        }

        let body = resp
            .text()
            .await
            .context("Failed to read search response body")?;
        debug!(bytes = body.len(), "Search page received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_query() {
        let fetcher = SearchPageFetcher::new(&SearchConfig::default()).unwrap();
        assert_eq!(
            fetcher.url_for("BMW X5 2021 site:mobile.de"),
            "https://www.google.com/search?q=BMW%20X5%202021%20site%3Amobile.de"
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let cfg = SearchConfig {
            endpoint: "http://localhost:9/search?q=".into(),
            ..SearchConfig::default()
        };
        let fetcher = SearchPageFetcher::new(&cfg).unwrap();
        assert!(fetcher.url_for("a b").starts_with("http://localhost:9/search?q=a%20b"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        // Port 9 (discard) is closed on loopback in practice.
        let cfg = SearchConfig {
            endpoint: "http://127.0.0.1:9/search?q=".into(),
            timeout_secs: 2,
            ..SearchConfig::default()
        };
        let fetcher = SearchPageFetcher::new(&cfg).unwrap();
        assert!(fetcher.fetch("anything").await.is_err());
    }
}
