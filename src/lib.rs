//! Lumi: a tag-filtered image board downloader
//!
//! This crate crawls the paginated listing pages of an image board, filters
//! the discovered posts by tag rules, and downloads matching images together
//! with sidecar caption files while exposing live progress to a caller.

pub mod config;
pub mod crawler;
pub mod output;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Lumi operations
#[derive(Debug, Error)]
pub enum LumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to fetch {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Please use {max} or fewer tags (got {count})")]
    TooManyTags { count: usize, max: usize },

    #[error("Config file has no [job] section")]
    MissingJob,
}

/// Result type alias for Lumi operations
pub type Result<T> = std::result::Result<T, LumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlerConfig, Job, JobSpec};
pub use crawler::{CrawlHandle, Coordinator};
pub use state::{Progress, ProgressSnapshot, RunStatus};
