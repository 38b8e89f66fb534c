//! Live crawl progress shared between workers and observers
//!
//! Every counter is an independent atomic. Workers only ever bump a single
//! field per outcome, so readers may see a mix of slightly different moments
//! across fields but never a torn value within one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Counters for one crawl invocation
#[derive(Debug)]
pub struct Progress {
    total_pages: AtomicU32,
    completed_pages: AtomicU32,
    requested_media: u32,
    downloaded_images: AtomicU32,
    skipped_images: AtomicU32,
    processed_links: AtomicU32,
    current_file_number: AtomicU32,
    terminated: AtomicBool,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of [`Progress`], serialized for the control server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_pages: u32,
    pub completed_pages: u32,
    pub total_media: u32,
    pub requested_media: u32,
    pub downloaded_images: u32,
    pub skipped_images: u32,
    pub processed_links: u32,
    pub current_file_number: u32,
    pub terminated: bool,
    pub started_at: DateTime<Utc>,
}

impl Progress {
    pub fn new(requested_media: u32) -> Self {
        Self {
            total_pages: AtomicU32::new(0),
            completed_pages: AtomicU32::new(0),
            requested_media,
            downloaded_images: AtomicU32::new(0),
            skipped_images: AtomicU32::new(0),
            processed_links: AtomicU32::new(0),
            current_file_number: AtomicU32::new(0),
            terminated: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    /// Records a listing page that yielded links; returns the new page total
    pub fn record_page(&self) -> u32 {
        self.total_pages.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_page_completed(&self) {
        self.completed_pages.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a post link handed to the link processor
    pub fn record_link(&self) {
        self.processed_links.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_download(&self) {
        self.downloaded_images.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skip(&self) {
        self.skipped_images.fetch_add(1, Ordering::SeqCst);
    }

    /// Allocates the next output file number
    ///
    /// Numbers start at 1 and are never handed out twice, even when the
    /// download that claimed one fails.
    pub fn next_file_number(&self) -> u32 {
        self.current_file_number.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks the listing as exhausted. Never reset.
    pub fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages.load(Ordering::SeqCst)
    }

    pub fn completed_pages(&self) -> u32 {
        self.completed_pages.load(Ordering::SeqCst)
    }

    pub fn downloaded(&self) -> u32 {
        self.downloaded_images.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> u32 {
        self.skipped_images.load(Ordering::SeqCst)
    }

    pub fn processed_links(&self) -> u32 {
        self.processed_links.load(Ordering::SeqCst)
    }

    pub fn current_file_number(&self) -> u32 {
        self.current_file_number.load(Ordering::SeqCst)
    }

    pub fn requested_media(&self) -> u32 {
        self.requested_media
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True once enough images have been downloaded
    pub fn quota_met(&self) -> bool {
        self.downloaded() >= self.requested_media
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_pages: self.total_pages(),
            completed_pages: self.completed_pages(),
            total_media: self.requested_media,
            requested_media: self.requested_media,
            downloaded_images: self.downloaded(),
            skipped_images: self.skipped(),
            processed_links: self.processed_links(),
            current_file_number: self.current_file_number(),
            terminated: self.is_terminated(),
            started_at: self.started_at,
        }
    }
}
