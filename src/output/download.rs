//! Media download to disk

use crate::url::file_name_from_url;
use crate::LumiError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Writes the body behind a URL to a file
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Downloads `url` to `dest`, returning the path actually written
    ///
    /// When `dest` is an existing directory the file name is taken from the URL.
    async fn download(&self, dest: &Path, url: &str) -> Result<PathBuf, LumiError>;
}

/// [`MediaDownloader`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Resolves the file a download should land in
pub async fn resolve_destination(dest: &Path, url: &str) -> PathBuf {
    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.is_dir() => dest.join(file_name_from_url(url)),
        _ => dest.to_path_buf(),
    }
}

#[async_trait]
impl MediaDownloader for HttpDownloader {
    async fn download(&self, dest: &Path, url: &str) -> Result<PathBuf, LumiError> {
        let path = resolve_destination(dest, url).await;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LumiError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LumiError::Download {
                url: url.to_string(),
                message: format!("bad status: {}", status),
            });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = write_body(&mut response, &path, url).await {
            // Never leave a truncated image at the numbered path
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::debug!("Could not remove partial {}: {}", path.display(), remove_err);
            }
            return Err(e);
        }

        tracing::debug!("Saved {} to {}", url, path.display());
        Ok(path)
    }
}

async fn write_body(response: &mut reqwest::Response, path: &Path, url: &str) -> Result<(), LumiError> {
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await.map_err(|source| LumiError::Http {
        url: url.to_string(),
        source,
    })? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
