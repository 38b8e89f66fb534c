//! HTTP fetcher implementation
//!
//! This module defines the page-fetch collaborator used by the crawler:
//! - Building HTTP clients with the configured user agent and timeouts
//! - A single GET attempt returning status, final URL and body
//!
//! Retrying lives one level up, in [`crate::crawler::RateLimitedFetcher`].

use crate::config::CrawlerConfig;
use crate::LumiError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// A fetched HTML document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// True when the origin asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS.as_u16()
    }

    /// True for statuses worth retrying besides rate limiting
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Retrieves one page in a single attempt
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, LumiError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use lumi::config::CrawlerConfig;
/// use lumi::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, LumiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LumiError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| LumiError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}
