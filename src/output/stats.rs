//! Final crawl statistics
//!
//! This module turns a progress snapshot into the summary printed when a
//! crawl finishes.

use crate::state::ProgressSnapshot;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Listing pages that yielded links
    pub total_pages: u32,

    /// Listing pages whose links were all processed
    pub completed_pages: u32,

    /// Images the job asked for
    pub requested_media: u32,

    /// Images written to disk
    pub downloaded_images: u32,

    /// Posts filtered out or failed to download
    pub skipped_images: u32,

    /// Post links handed to the link processor
    pub processed_links: u32,

    /// Whether the listing ran out of posts
    pub terminated: bool,

    /// Wall-clock duration of the crawl
    pub duration_seconds: i64,
}

impl CrawlStatistics {
    pub fn from_snapshot(snapshot: &ProgressSnapshot, finished_at: DateTime<Utc>) -> Self {
        Self {
            total_pages: snapshot.total_pages,
            completed_pages: snapshot.completed_pages,
            requested_media: snapshot.requested_media,
            downloaded_images: snapshot.downloaded_images,
            skipped_images: snapshot.skipped_images,
            processed_links: snapshot.processed_links,
            terminated: snapshot.terminated,
            duration_seconds: (finished_at - snapshot.started_at).num_seconds().max(0),
        }
    }

    /// Share of the requested images that were downloaded, in percent
    pub fn fulfillment(&self) -> f64 {
        if self.requested_media == 0 {
            return 0.0;
        }
        (self.downloaded_images as f64 / self.requested_media as f64 * 100.0).min(100.0)
    }

    /// Posts that were fetched but neither downloaded nor skipped
    pub fn unprocessable(&self) -> u32 {
        self.processed_links
            .saturating_sub(self.downloaded_images + self.skipped_images)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Listing pages crawled: {}", stats.total_pages);
    println!("  Listing pages completed: {}", stats.completed_pages);
    println!();

    println!("Posts:");
    println!("  Links processed: {}", stats.processed_links);
    println!("  Downloaded: {}", stats.downloaded_images);
    println!("  Skipped: {}", stats.skipped_images);
    println!("  Unprocessable: {}", stats.unprocessable());
    println!();

    if stats.terminated {
        println!("Crawl stopped early: no more content");
        println!();
    }

    println!(
        "Fulfillment: {:.1}% ({} / {} images) in {}s",
        stats.fulfillment(),
        stats.downloaded_images,
        stats.requested_media,
        stats.duration_seconds
    );
}
