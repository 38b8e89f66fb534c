//! Listing page crawler
//!
//! Fetches one listing page, extracts its post links and feeds them to the
//! link processor, either one at a time or through a bounded link pool.

use crate::crawler::context::CrawlRun;
use crate::crawler::parser::extract_post_links;
use crate::crawler::pool::WorkerPool;
use crate::crawler::processor::process_link;
use crate::url::build_listing_url;

/// What happened to a single listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page could not be fetched after all retries
    Skipped,
    /// The page had no post links; the crawl is marked terminated
    Exhausted,
    /// Links were found; `completed` is false when the quota cut the page short
    Crawled { links: usize, completed: bool },
}

/// Fetches a listing page and returns its post links
///
/// An empty page marks the crawl terminated. A page with links counts
/// towards the crawled page total.
async fn fetch_links(run: &CrawlRun, page: u32) -> Result<Vec<String>, PageOutcome> {
    let url = match build_listing_url(&run.ctx.settings.base_url, page, &run.job.tags) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Cannot build URL for listing page {}: {}", page, e);
            return Err(PageOutcome::Skipped);
        }
    };

    tracing::info!("Crawling page {}: {}", page, url);

    let fetched = match run.ctx.fetcher.fetch(url.as_str()).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("Giving up on listing page {}: {}", page, e);
            return Err(PageOutcome::Skipped);
        }
    };

    let links = extract_post_links(&fetched.body, &fetched.url);
    if links.is_empty() {
        tracing::info!("No links found on page {}. Terminating crawl.", page);
        run.progress.mark_terminated();
        return Err(PageOutcome::Exhausted);
    }

    let total = run.progress.record_page();
    tracing::debug!("Page {} has {} links ({} pages so far)", page, links.len(), total);
    Ok(links)
}

/// Crawls a listing page, processing its links one after another
///
/// Stops before a link once the quota is met, and after a link once this
/// crawl has downloaded a full page's worth for every page seen so far.
pub(crate) async fn crawl_page_sequential(run: &CrawlRun, page: u32) -> PageOutcome {
    let links = match fetch_links(run, page).await {
        Ok(links) => links,
        Err(outcome) => return outcome,
    };

    let capacity = run.ctx.settings.page_capacity;
    for (index, link) in links.iter().enumerate() {
        if run.progress.quota_met() {
            tracing::info!("Reached requested media count on page {}", page);
            return PageOutcome::Crawled {
                links: links.len(),
                completed: false,
            };
        }

        process_link(run, link).await;

        let ceiling = run.progress.total_pages().saturating_mul(capacity);
        let remaining = index + 1 < links.len();
        if remaining && run.progress.downloaded() >= ceiling {
            tracing::debug!("Page {} reached its share of {} downloads", page, ceiling);
            return PageOutcome::Crawled {
                links: links.len(),
                completed: false,
            };
        }
    }

    run.progress.record_page_completed();
    PageOutcome::Crawled {
        links: links.len(),
        completed: true,
    }
}

/// Crawls a listing page, processing its links on a bounded link pool
///
/// Each link waits for a free worker and is dispatched only if the quota is
/// still unmet. The page returns once every dispatched link has finished.
pub(crate) async fn crawl_page_parallel(run: CrawlRun, page: u32) -> PageOutcome {
    let links = match fetch_links(&run, page).await {
        Ok(links) => links,
        Err(outcome) => return outcome,
    };

    let mut pool = WorkerPool::new(run.ctx.settings.link_workers as usize);
    let mut dispatched = 0;

    for link in &links {
        let slot = pool.reserve().await;
        if run.progress.quota_met() {
            tracing::info!("Reached requested media count on page {}", page);
            break;
        }

        let run = run.clone();
        let link = link.clone();
        pool.spawn_reserved(slot, async move { process_link(&run, &link).await });
        dispatched += 1;
    }

    let outcomes = pool.join().await;
    let downloads = outcomes.iter().filter(|o| o.is_download()).count();
    tracing::debug!(
        "Page {}: {} of {} dispatched links downloaded",
        page,
        downloads,
        dispatched
    );

    let completed = dispatched == links.len();
    if completed {
        run.progress.record_page_completed();
    }

    PageOutcome::Crawled {
        links: links.len(),
        completed,
    }
}
