use crate::config::{CrawlerConfig, Job};
use crate::crawler::filter::TagFilter;
use crate::crawler::retry::RateLimitedFetcher;
use crate::output::{MediaDownloader, OutputLayout};
use crate::state::Progress;
use std::sync::Arc;

/// Long-lived collaborators shared by every crawl of a coordinator
pub(crate) struct CrawlContext {
    pub settings: CrawlerConfig,
    pub fetcher: RateLimitedFetcher,
    pub downloader: Arc<dyn MediaDownloader>,
    pub layout: OutputLayout,
}

/// Everything a worker needs for one crawl invocation
///
/// Cheap to clone; each spawned worker takes its own copy.
#[derive(Clone)]
pub(crate) struct CrawlRun {
    pub ctx: Arc<CrawlContext>,
    pub job: Arc<Job>,
    pub filter: Arc<TagFilter>,
    pub progress: Arc<Progress>,
}

impl CrawlRun {
    pub fn new(ctx: Arc<CrawlContext>, job: Arc<Job>, progress: Arc<Progress>) -> Self {
        let filter = Arc::new(TagFilter::from_job(&job));
        Self {
            ctx,
            job,
            filter,
            progress,
        }
    }
}
