//! Configuration module for Lumi
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning raw job descriptions into normalized [`Job`]s.
//!
//! # Example
//!
//! ```no_run
//! use lumi::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lumi.toml")).unwrap();
//! let job = config.job().unwrap();
//! println!("Downloading {} images for {}", job.requested_media, job.project);
//! ```

mod parser;
mod types;
pub mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, Job, JobSpec, DEFAULT_MEDIA_COUNT, MAX_MEDIA_COUNT, MAX_SEARCH_TAGS,
    MIN_MEDIA_COUNT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
