//! Link processor
//!
//! Turns one post detail link into at most one downloaded image plus its
//! caption file, or a skip.

use crate::crawler::context::CrawlRun;
use crate::crawler::filter::FilterDecision;
use crate::crawler::parser::{parse_detail, DetailPage};
use crate::output::write_caption;
use crate::url::media_extension;
use crate::LumiError;
use std::path::PathBuf;

/// What happened to a single post link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The image was written as file number `number`
    Downloaded { number: u32, path: PathBuf },
    /// The tag filter rejected the post
    Filtered(FilterDecision),
    /// The post was accepted but the image could not be saved
    DownloadFailed { number: u32 },
    /// The detail page could not be fetched or had no usable image
    Unprocessable,
}

impl LinkOutcome {
    pub fn is_download(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }
}

/// Processes one post detail link
///
/// Every call counts as a processed link. Filtered posts and failed
/// downloads count as skips; unreachable or malformed detail pages count
/// as neither.
pub(crate) async fn process_link(run: &CrawlRun, link: &str) -> LinkOutcome {
    run.progress.record_link();

    let detail = match fetch_detail(run, link).await {
        Ok(detail) => detail,
        Err(e) => {
            tracing::warn!("Skipping post {}: {}", link, e);
            return LinkOutcome::Unprocessable;
        }
    };

    let decision = run.filter.evaluate(&detail.tags);
    if !decision.is_accept() {
        run.progress.record_skip();
        match &decision {
            FilterDecision::Ignored(tag) => {
                tracing::info!("Skipped {}: has ignored tag '{}'", link, tag)
            }
            FilterDecision::MissingRequired(tag) => {
                tracing::info!("Skipped {}: missing required tag '{}'", link, tag)
            }
            FilterDecision::Accept => {}
        }
        return LinkOutcome::Filtered(decision);
    }

    let project = &run.job.project;
    let number = run.progress.next_file_number();
    let image_path = run
        .ctx
        .layout
        .image_path(project, number, media_extension(&detail.media_url));

    let saved = match run.ctx.downloader.download(&image_path, &detail.media_url).await {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!("Error downloading image {}: {}", detail.media_url, e);
            run.progress.record_skip();
            return LinkOutcome::DownloadFailed { number };
        }
    };
    run.progress.record_download();

    if run.ctx.settings.captions {
        let caption_path = run.ctx.layout.caption_path(project, number);
        match write_caption(&detail.tags, &caption_path).await {
            Ok(()) => tracing::info!(
                "Downloaded: {}, Caption: {}",
                saved.display(),
                caption_path.display()
            ),
            Err(e) => tracing::warn!("Error saving caption {}: {}", caption_path.display(), e),
        }
    } else {
        tracing::info!("Downloaded: {}", saved.display());
    }

    LinkOutcome::Downloaded {
        number,
        path: saved,
    }
}

/// Fetches a post's detail page and extracts its media URL and tags
async fn fetch_detail(run: &CrawlRun, link: &str) -> Result<DetailPage, LumiError> {
    let page = run.ctx.fetcher.fetch(link).await?;

    parse_detail(&page.body, &page.url).map_err(|failure| {
        tracing::debug!("Full HTML of {}:\n{}", link, page.body);
        LumiError::Extraction {
            url: link.to_string(),
            message: failure.describe().to_string(),
        }
    })
}
