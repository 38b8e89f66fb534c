//! Crawl coordinator - main crawl orchestration logic
//!
//! This module decides how a job is crawled and drives it to completion:
//! - Validating the job and preparing its output directory
//! - Choosing between a single sequential page and a parallel page sweep
//! - Continuing page by page after a sweep until the quota is met or content
//!   runs out
//! - Running crawls in the background for the control server

use crate::config::validation::{validate_crawler_config, validate_project_name, validate_search_tags};
use crate::config::{Config, CrawlerConfig, Job};
use crate::crawler::context::{CrawlContext, CrawlRun};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::crawler::listing::{crawl_page_parallel, crawl_page_sequential, PageOutcome};
use crate::crawler::pool::WorkerPool;
use crate::crawler::retry::{RateLimitedFetcher, RetryPolicy};
use crate::output::{HttpDownloader, MediaDownloader, OutputLayout};
use crate::state::Progress;
use crate::LumiError;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// How the first pages of a crawl are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStrategy {
    /// The quota fits on less than one full page: crawl page 1 link by link
    Sequential,
    /// Crawl pages `1..=full_pages` concurrently
    ParallelSweep { full_pages: u32 },
}

/// Picks the strategy for a quota given the board's page capacity
pub fn select_strategy(requested_media: u32, page_capacity: u32) -> CrawlStrategy {
    match requested_media / page_capacity.max(1) {
        0 => CrawlStrategy::Sequential,
        full_pages => CrawlStrategy::ParallelSweep { full_pages },
    }
}

/// Main crawler coordinator structure
///
/// A coordinator owns the HTTP collaborators and can run any number of
/// crawls, one after another or in the background.
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
}

/// A crawl running in the background
pub struct CrawlHandle {
    progress: Arc<Progress>,
    task: JoinHandle<()>,
}

impl CrawlHandle {
    /// Live counters of the running crawl
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the crawl to finish and returns its final counters
    pub async fn wait(self) -> Arc<Progress> {
        if let Err(e) = self.task.await {
            tracing::error!("Crawl task failed: {}", e);
        }
        self.progress
    }
}

impl Coordinator {
    /// Creates a new coordinator talking to the board over HTTP
    ///
    /// # Arguments
    ///
    /// * `settings` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LumiError)` - Invalid settings or the HTTP client could not be built
    pub fn new(settings: CrawlerConfig) -> Result<Self, LumiError> {
        validate_crawler_config(&settings)?;

        let client = build_http_client(&settings)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(client.clone()));
        let downloader: Arc<dyn MediaDownloader> = Arc::new(HttpDownloader::new(client));

        Ok(Self::with_collaborators(settings, fetcher, downloader))
    }

    /// Creates a coordinator around caller-provided fetcher and downloader
    pub fn with_collaborators(
        settings: CrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        let fetcher = RateLimitedFetcher::new(fetcher, RetryPolicy::from_config(&settings));
        Self::with_retry_fetcher(settings, fetcher, downloader)
    }

    pub(crate) fn with_retry_fetcher(
        settings: CrawlerConfig,
        fetcher: RateLimitedFetcher,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        let layout = OutputLayout::new(&settings.output_root);
        Self {
            ctx: Arc::new(CrawlContext {
                settings,
                fetcher,
                downloader,
                layout,
            }),
        }
    }

    pub fn settings(&self) -> &CrawlerConfig {
        &self.ctx.settings
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.ctx.layout
    }

    /// Validates a job and creates its output directory
    ///
    /// Nothing touches the filesystem when the job is rejected.
    fn prepare(&self, job: &Job) -> Result<Arc<Progress>, LumiError> {
        validate_search_tags(&job.tags)?;
        validate_project_name(&job.project)?;

        tracing::info!(
            "Starting crawl for project '{}': tags [{}], {} images requested",
            job.project,
            job.tags.join(" "),
            job.requested_media
        );
        if !job.and_tags.is_empty() {
            tracing::info!("Required tags: {:?}", job.and_tags);
        }
        if !job.ignore_tags.is_empty() {
            tracing::info!("Ignored tags: {:?}", job.ignore_tags);
        }

        let dir = self.ctx.layout.prepare_project(&job.project)?;
        tracing::info!("Saving images to {}", dir.display());

        Ok(Arc::new(Progress::new(job.requested_media)))
    }

    /// Runs a crawl to completion
    ///
    /// Page and post failures are logged and counted, never returned; the
    /// only errors are a rejected job or an output directory that cannot be
    /// created.
    pub async fn run(&self, job: Job) -> Result<Arc<Progress>, LumiError> {
        let progress = self.prepare(&job)?;
        execute(Arc::clone(&self.ctx), Arc::new(job), Arc::clone(&progress)).await;
        Ok(progress)
    }

    /// Starts a crawl in the background
    ///
    /// Validation and directory creation happen before this returns, so a
    /// rejected job never spawns a task.
    pub fn launch(&self, job: Job) -> Result<CrawlHandle, LumiError> {
        let progress = self.prepare(&job)?;
        let task = tokio::spawn(execute(
            Arc::clone(&self.ctx),
            Arc::new(job),
            Arc::clone(&progress),
        ));
        Ok(CrawlHandle { progress, task })
    }
}

/// Drives one crawl through its strategy
///
/// A quota below one full page crawls page 1 once. Larger quotas sweep the
/// full pages in parallel and then continue page by page.
async fn execute(ctx: Arc<CrawlContext>, job: Arc<Job>, progress: Arc<Progress>) {
    let run = CrawlRun::new(ctx, job, progress);

    match select_strategy(run.job.requested_media, run.ctx.settings.page_capacity) {
        CrawlStrategy::Sequential => {
            tracing::info!("Requested images fit on one page, crawling page 1 sequentially");
            if let PageOutcome::Skipped = crawl_page_sequential(&run, 1).await {
                tracing::warn!("Page 1 could not be fetched, nothing was downloaded");
            }
        }
        CrawlStrategy::ParallelSweep { full_pages } => {
            sweep_pages(&run, full_pages).await;
            crawl_sequentially(&run, full_pages + 1).await;
        }
    }

    let progress = &run.progress;
    if progress.is_terminated() {
        tracing::info!("Crawling process terminated due to no more content");
    }
    let elapsed = chrono::Utc::now() - progress.started_at();
    tracing::info!(
        "Downloads completed for project '{}' in {}s. Downloaded: {}, Skipped: {}, Links processed: {}",
        run.job.project,
        elapsed.num_seconds().max(0),
        progress.downloaded(),
        progress.skipped(),
        progress.processed_links()
    );
}

/// Crawls pages `1..=full_pages` on a bounded page pool
///
/// A page whose slot opens after the quota is met or the listing ran out is
/// never fetched.
async fn sweep_pages(run: &CrawlRun, full_pages: u32) {
    let mut pool = WorkerPool::new(run.ctx.settings.page_workers as usize);
    tracing::info!(
        "Crawling {} pages with {} page workers",
        full_pages,
        pool.size()
    );

    for page in 1..=full_pages {
        let slot = pool.reserve().await;
        if run.progress.quota_met() || run.progress.is_terminated() {
            tracing::debug!("Stopping page sweep before page {}", page);
            break;
        }

        let run = run.clone();
        pool.spawn_reserved(slot, crawl_page_parallel(run, page));
    }

    let outcomes = pool.join().await;
    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, PageOutcome::Crawled { completed: true, .. }))
        .count();
    tracing::info!(
        "Page sweep finished: {} pages started, {} completed",
        outcomes.len(),
        completed
    );
}

/// Crawls one page at a time from `start_page` after a page sweep
///
/// Stops once the quota is met, the listing runs out, or too many pages in
/// a row could not be fetched.
async fn crawl_sequentially(run: &CrawlRun, start_page: u32) {
    let max_failed = run.ctx.settings.max_failed_pages;
    let mut failed_in_a_row = 0;
    let mut page = start_page;

    while !run.progress.quota_met() && !run.progress.is_terminated() {
        tracing::info!(
            "Need {} more images, crawling page {}",
            run.progress
                .requested_media()
                .saturating_sub(run.progress.downloaded()),
            page
        );

        match crawl_page_sequential(run, page).await {
            PageOutcome::Skipped => {
                failed_in_a_row += 1;
                if max_failed > 0 && failed_in_a_row >= max_failed {
                    tracing::warn!(
                        "Giving up after {} listing pages in a row could not be fetched",
                        failed_in_a_row
                    );
                    break;
                }
            }
            _ => failed_in_a_row = 0,
        }

        page = page.saturating_add(1);
    }
}

/// Runs the job described by a configuration file
///
/// # Example
///
/// ```no_run
/// use lumi::config::load_config;
/// use lumi::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("lumi.toml"))?;
/// let progress = run_crawl(config).await?;
/// println!("downloaded {}", progress.downloaded());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<Arc<Progress>, LumiError> {
    let job = config.job()?;
    let coordinator = Coordinator::new(config.crawler)?;
    coordinator.run(job).await
}
