use crate::LumiError;
use std::path::Path;

/// Joins tags the way caption files store them
pub fn format_caption(tags: &[String]) -> String {
    tags.join(", ")
}

/// Writes a caption file next to a downloaded image
pub async fn write_caption(tags: &[String], path: &Path) -> Result<(), LumiError> {
    tokio::fs::write(path, format_caption(tags)).await?;
    Ok(())
}
