//! URL handling module for Lumi
//!
//! Builds listing page URLs and derives file names and extensions from media URLs.

use crate::LumiError;
use url::Url;

/// Extensions kept verbatim when naming downloaded media
const MEDIA_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "bmp", "mp4", "webm",
];

/// Extension used when a media URL carries no recognizable one
pub const DEFAULT_MEDIA_EXTENSION: &str = "png";

/// Builds the URL of one listing page
///
/// Search tags are space-joined into a single `tags` query value, which
/// form-encodes as `tags=a+b`.
///
/// # Example
///
/// ```
/// use lumi::url::build_listing_url;
///
/// let url = build_listing_url(
///     "https://board.example.com/posts",
///     3,
///     &["blue_sky".to_string(), "cloud".to_string()],
/// )
/// .unwrap();
/// assert_eq!(url.as_str(), "https://board.example.com/posts?page=3&tags=blue_sky+cloud");
/// ```
pub fn build_listing_url(base_url: &str, page: u32, tags: &[String]) -> Result<Url, LumiError> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("tags", &tags.join(" "));
    Ok(url)
}

/// Returns the last path segment of a URL, without its query string
///
/// Falls back to `"file"` when the path ends with a slash.
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    match without_query.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "file".to_string(),
    }
}

/// Picks the extension for a downloaded media file
pub fn media_extension(url: &str) -> &'static str {
    let name = file_name_from_url(url).to_ascii_lowercase();
    name.rsplit_once('.')
        .and_then(|(_, ext)| MEDIA_EXTENSIONS.iter().copied().find(|known| *known == ext))
        .unwrap_or(DEFAULT_MEDIA_EXTENSION)
}
