//! Output module for downloaded media and crawl reports
//!
//! This module handles:
//! - Naming and creating project output directories
//! - Downloading media to disk
//! - Writing caption files
//! - Summarizing crawl statistics

mod caption;
mod download;
mod layout;
pub mod stats;

pub use caption::{format_caption, write_caption};
pub use download::{resolve_destination, HttpDownloader, MediaDownloader};
pub use layout::OutputLayout;
pub use stats::{print_statistics, CrawlStatistics};
