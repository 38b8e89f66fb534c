use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Media count used when a job does not request one (or requests zero)
pub const DEFAULT_MEDIA_COUNT: u32 = 20;

/// Smallest media count a job may request
pub const MIN_MEDIA_COUNT: u32 = 1;

/// Largest media count a job may request
pub const MAX_MEDIA_COUNT: u32 = 10_000;

/// Maximum number of search tags per job
pub const MAX_SEARCH_TAGS: usize = 2;

/// Main configuration structure for Lumi
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Crawl target; absent when the file only carries crawler settings
    #[serde(default)]
    pub job: Option<JobSpec>,

    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Listing endpoint of the image board
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of post links expected on a full listing page
    #[serde(rename = "page-capacity")]
    pub page_capacity: u32,

    /// Listing pages crawled concurrently during the parallel sweep
    #[serde(rename = "page-workers")]
    pub page_workers: u32,

    /// Post links processed concurrently within one listing page
    #[serde(rename = "link-workers")]
    pub link_workers: u32,

    /// Fetch attempts before a page or post is abandoned
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Lower bound of the randomized retry delay (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized retry delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Consecutive unreachable listing pages tolerated by sequential continuation
    #[serde(rename = "max-failed-pages")]
    pub max_failed_pages: u32,

    /// Directory under which every project gets its own output directory
    #[serde(rename = "output-root")]
    pub output_root: String,

    /// Whether a caption file is written next to each image
    pub captions: bool,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://danbooru.donmai.us/posts".to_string(),
            page_capacity: 20,
            page_workers: 10,
            link_workers: 5,
            max_attempts: 3,
            min_delay_ms: 3_000,
            max_delay_ms: 10_000,
            max_failed_pages: 5,
            output_root: "lumi-project".to_string(),
            captions: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Raw job description as written in a config file or posted to the control server
///
/// Tag lists are kept verbatim here; [`JobSpec::into_job`] produces the
/// normalized [`Job`] the crawler works with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobSpec {
    /// Project name, used to namespace output files
    #[serde(default)]
    pub project: String,

    /// Search tags sent to the listing endpoint
    #[serde(default, alias = "tag")]
    pub tags: Vec<String>,

    /// Tags that must all be present on a post
    #[serde(default)]
    pub and: Vec<String>,

    /// Tags that discard a post when any of them is present
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Number of images to download
    #[serde(default, rename = "media-count", alias = "mediaCount")]
    pub media_count: Option<i64>,
}

/// Validated crawl target
///
/// Built once from a [`JobSpec`] and never mutated afterwards; the crawler
/// shares it between workers behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub project: String,
    pub tags: Vec<String>,
    pub and_tags: BTreeSet<String>,
    pub ignore_tags: BTreeSet<String>,
    pub requested_media: u32,
}

impl JobSpec {
    /// Normalizes tags and clamps the media count
    pub fn into_job(self) -> Job {
        crate::config::validation::normalize_job(self)
    }
}
