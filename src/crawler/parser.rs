//! HTML parser for listing and detail pages
//!
//! This module extracts:
//! - Post links from a listing page (`.post-preview-link` anchors)
//! - The media URL and tag list from a post's detail page
//!
//! Parsing is synchronous and returns owned data, so no DOM handle is held
//! across an await point.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Class carried by the anchors of a listing page
pub const POST_LINK_CLASS: &str = "post-preview-link";

/// Class of the element wrapping the full-size media on a detail page
pub const IMAGE_CONTAINER_CLASS: &str = "image-container";

/// Class carried by each tag entry on a detail page
pub const TAG_CLASS: &str = "search-tag";

/// Media and tags extracted from a post's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    /// Absolute URL of the full-size media
    pub media_url: String,

    /// Tags in page order, spaces replaced by underscores
    pub tags: Vec<String>,
}

/// Why a detail page could not be turned into a [`DetailPage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// No `.image-container` element
    MissingContainer,
    /// The container has no `img#image`
    MissingImage,
    /// The image has no usable source attribute
    MissingSource,
}

impl ExtractionFailure {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::MissingContainer => "no image-container found",
            Self::MissingImage => "no image found with id 'image'",
            Self::MissingSource => "image has no usable source",
        }
    }
}

/// Extracts the ordered post links of a listing page
///
/// # Example
///
/// ```
/// use lumi::crawler::extract_post_links;
/// use url::Url;
///
/// let html = r#"<a class="post-preview-link" href="/posts/1">1</a>"#;
/// let base = Url::parse("https://board.example.com/posts?page=1").unwrap();
/// assert_eq!(extract_post_links(html, &base), vec!["https://board.example.com/posts/1"]);
/// ```
pub fn extract_post_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(&format!("a.{}[href]", POST_LINK_CLASS)) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Extracts the media URL and tags from a detail page
pub fn parse_detail(html: &str, base_url: &Url) -> Result<DetailPage, ExtractionFailure> {
    let document = Html::parse_document(html);

    let container_selector = Selector::parse(&format!(".{}", IMAGE_CONTAINER_CLASS))
        .map_err(|_| ExtractionFailure::MissingContainer)?;
    let image_selector =
        Selector::parse("img#image").map_err(|_| ExtractionFailure::MissingImage)?;

    let container = document
        .select(&container_selector)
        .next()
        .ok_or(ExtractionFailure::MissingContainer)?;
    let image = container
        .select(&image_selector)
        .next()
        .ok_or(ExtractionFailure::MissingImage)?;

    let media_url = media_source(&image, base_url).ok_or(ExtractionFailure::MissingSource)?;
    let tags = extract_tags(&document);

    Ok(DetailPage { media_url, tags })
}

/// Resolves the media source of an element
///
/// Attributes are tried in order: `src`, `href`, the first candidate of
/// `srcset`, then `data-src`. The first one present wins, even if it then
/// fails to resolve.
fn media_source(element: &ElementRef<'_>, base_url: &Url) -> Option<String> {
    let attrs = element.value();
    let raw = if let Some(src) = attrs.attr("src") {
        src
    } else if let Some(href) = attrs.attr("href") {
        href
    } else if let Some(srcset) = attrs.attr("srcset") {
        srcset.split_whitespace().next()?.trim_end_matches(',')
    } else {
        attrs.attr("data-src")?
    };

    resolve_link(raw, base_url)
}

/// Collects tag names from `.search-tag` elements
fn extract_tags(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(&format!(".{}", TAG_CLASS)) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .map(|text| text.trim().replace(' ', "_"))
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, data: schemes
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
