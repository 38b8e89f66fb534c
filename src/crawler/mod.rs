//! Crawler module for image board listing and post processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with randomized retry on rate limits
//! - Listing and detail page extraction
//! - Tag filtering of posts
//! - Bounded worker pools for pages and links
//! - Overall crawl coordination

mod context;
mod coordinator;
mod fetcher;
mod filter;
mod listing;
mod parser;
mod pool;
mod processor;
mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{run_crawl, select_strategy, CrawlHandle, CrawlStrategy, Coordinator};
pub use fetcher::{build_http_client, FetchedPage, HttpFetcher, PageFetcher};
pub use filter::{FilterDecision, TagFilter};
pub use listing::PageOutcome;
pub use parser::{extract_post_links, parse_detail, DetailPage, ExtractionFailure};
pub use pool::{Slot, WorkerPool};
pub use processor::LinkOutcome;
pub use retry::{jittered_delay, RateLimitedFetcher, RetryPolicy};
