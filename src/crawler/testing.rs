//! In-memory collaborators for crawler unit tests

use crate::config::{CrawlerConfig, Job};
use crate::crawler::context::{CrawlContext, CrawlRun};
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::retry::{RateLimitedFetcher, RetryPolicy};
use crate::output::{MediaDownloader, OutputLayout};
use crate::state::Progress;
use crate::url::build_listing_url;
use crate::LumiError;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;

pub(crate) const BASE_URL: &str = "https://board.example.com/posts";

/// One scripted answer from the fake board
#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Page { status: u16, body: String },
    Error,
}

impl FakeResponse {
    pub(crate) fn html(body: impl Into<String>) -> Self {
        Self::Page {
            status: 200,
            body: body.into(),
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Self::Page {
            status,
            body: String::new(),
        }
    }
}

/// A scripted image board
///
/// Each URL answers from its script in order, repeating the last entry.
/// Unscripted URLs answer with an empty page, which reads as an exhausted listing.
#[derive(Default)]
pub(crate) struct FakeBoard {
    scripts: Mutex<HashMap<String, VecDeque<FakeResponse>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeBoard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, url: &str, responses: Vec<FakeResponse>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
    }

    pub(crate) fn page(&self, url: &str, body: String) {
        self.script(url, vec![FakeResponse::html(body)]);
    }

    /// Serves a listing page linking to the given detail URLs
    pub(crate) fn listing(&self, tags: &[String], page: u32, links: &[String]) {
        let url = listing_url(tags, page);
        self.page(&url, listing_html(links));
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl PageFetcher for FakeBoard {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, LumiError> {
        self.requests.lock().unwrap().push(url.to_string());

        let response = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(url) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(FakeResponse::Page { status, body }) => Ok(FetchedPage {
                url: Url::parse(url)?,
                status,
                body,
            }),
            Some(FakeResponse::Error) => Err(LumiError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            None => Ok(FetchedPage {
                url: Url::parse(url)?,
                status: 200,
                body: "<html><body></body></html>".to_string(),
            }),
        }
    }
}

/// Records downloads and writes a placeholder file for each one
#[derive(Default)]
pub(crate) struct FakeDownloader {
    downloads: Mutex<Vec<(PathBuf, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_on(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub(crate) fn downloads(&self) -> Vec<(PathBuf, String)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(&self, dest: &Path, url: &str) -> Result<PathBuf, LumiError> {
        if self.failing.lock().unwrap().contains(url) {
            return Err(LumiError::Download {
                url: url.to_string(),
                message: "bad status: 500".to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, b"image").await?;
        self.downloads
            .lock()
            .unwrap()
            .push((dest.to_path_buf(), url.to_string()));
        Ok(dest.to_path_buf())
    }
}

pub(crate) fn listing_url(tags: &[String], page: u32) -> String {
    build_listing_url(BASE_URL, page, tags).unwrap().to_string()
}

pub(crate) fn post_url(id: u32) -> String {
    format!("https://board.example.com/posts/{}", id)
}

pub(crate) fn media_url(id: u32) -> String {
    format!("https://cdn.example.com/original/{}.jpg", id)
}

pub(crate) fn listing_html(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<article><a class="post-preview-link" href="{}">post</a></article>"#, link))
        .collect();
    format!("<html><body><div id=\"posts\">{}</div></body></html>", anchors)
}

pub(crate) fn detail_html(media: &str, tags: &[&str]) -> String {
    let tag_items: String = tags
        .iter()
        .map(|tag| format!(r#"<li><a class="search-tag" href="/posts?tags={0}">{0}</a></li>"#, tag.replace('_', " ")))
        .collect();
    format!(
        r#"<html><body>
            <section class="image-container"><img id="image" src="{}" alt="post"></section>
            <ul class="tag-list">{}</ul>
        </body></html>"#,
        media, tag_items
    )
}

/// Serves a detail page for post `id` with the given tags
pub(crate) fn serve_post(board: &FakeBoard, id: u32, tags: &[&str]) -> String {
    let url = post_url(id);
    board.page(&url, detail_html(&media_url(id), tags));
    url
}

/// Fake board, fake downloader and a temporary output root wired together
pub(crate) struct Harness {
    pub board: Arc<FakeBoard>,
    pub downloader: Arc<FakeDownloader>,
    pub settings: CrawlerConfig,
    pub temp: TempDir,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let settings = CrawlerConfig {
            base_url: BASE_URL.to_string(),
            output_root: temp.path().display().to_string(),
            max_attempts: 2,
            min_delay_ms: 1,
            max_delay_ms: 2,
            ..CrawlerConfig::default()
        };
        Self {
            board: Arc::new(FakeBoard::new()),
            downloader: Arc::new(FakeDownloader::new()),
            settings,
            temp,
        }
    }

    pub(crate) fn retry_fetcher(&self) -> RateLimitedFetcher {
        RateLimitedFetcher::with_rng(
            self.board.clone(),
            RetryPolicy::from_config(&self.settings),
            StdRng::seed_from_u64(7),
        )
    }

    pub(crate) fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.temp.path())
    }

    pub(crate) fn context(&self) -> Arc<CrawlContext> {
        Arc::new(CrawlContext {
            settings: self.settings.clone(),
            fetcher: self.retry_fetcher(),
            downloader: self.downloader.clone(),
            layout: self.layout(),
        })
    }

    pub(crate) fn run(&self, job: Job) -> CrawlRun {
        let progress = Arc::new(Progress::new(job.requested_media));
        CrawlRun::new(self.context(), Arc::new(job), progress)
    }
}

pub(crate) fn tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

/// A job for project "sky" searching `blue_sky`
pub(crate) fn sky_job(requested_media: u32) -> Job {
    Job {
        project: "sky".to_string(),
        tags: tags(&["blue_sky"]),
        and_tags: Default::default(),
        ignore_tags: Default::default(),
        requested_media,
    }
}

/// Serves `count` accepted posts starting at `first_id` on one listing page
pub(crate) fn serve_listing_page(board: &FakeBoard, job: &Job, page: u32, first_id: u32, count: u32) {
    let links: Vec<String> = (first_id..first_id + count)
        .map(|id| serve_post(board, id, &["blue_sky"]))
        .collect();
    board.listing(&job.tags, page, &links);
}
