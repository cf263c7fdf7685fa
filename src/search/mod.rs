//! Marketplace search.
//!
//! Defines the `PageFetcher` trait (the network boundary of the engine),
//! the category-aware keyword builder, and an HTTP implementation that
//! queries a web search endpoint.

pub mod keywords;
pub mod web;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over whatever turns a search query into page text.
///
/// Implementors are expected to handle URL construction, headers and
/// timeouts. Any error is treated by the caller as a failed query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Run one search query and return the raw response body.
    async fn fetch(&self, query: &str) -> Result<String>;
}
