//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for an image board and its media
//! CDN, and run full crawls through the real HTTP fetcher and downloader.

use lumi::config::{CrawlerConfig, Job};
use lumi::crawler::Coordinator;
use lumi::output::{HttpDownloader, MediaDownloader};
use std::path::Path;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates crawler settings pointing at the mock board
fn create_test_settings(server: &MockServer, output_root: &Path) -> CrawlerConfig {
    CrawlerConfig {
        base_url: format!("{}/posts", server.uri()),
        output_root: output_root.display().to_string(),
        min_delay_ms: 1, // Very short for testing
        max_delay_ms: 5,
        ..CrawlerConfig::default()
    }
}

fn create_job(tags: &[&str], requested_media: u32) -> Job {
    Job {
        project: "sky".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        and_tags: Default::default(),
        ignore_tags: Default::default(),
        requested_media,
    }
}

fn listing_html(server: &MockServer, ids: impl IntoIterator<Item = u32>) -> String {
    let links: String = ids
        .into_iter()
        .map(|id| {
            format!(
                r#"<article><a class="post-preview-link" href="{}/posts/{}">#{}</a></article>"#,
                server.uri(),
                id,
                id
            )
        })
        .collect();
    format!("<html><body><section id=\"posts\">{}</section></body></html>", links)
}

fn detail_html(id: u32, tags: &[&str]) -> String {
    let tag_links: String = tags
        .iter()
        .map(|tag| format!(r#"<li><a class="search-tag" href="/posts?tags={0}">{0}</a></li>"#, tag))
        .collect();
    format!(
        r#"<html><body>
        <section class="image-container">
            <picture><img id="image" src="/data/original/{}.jpg" alt="post"></picture>
        </section>
        <aside><ul>{}</ul></aside>
        </body></html>"#,
        id, tag_links
    )
}

/// Mounts a listing page for the given search tags
async fn mount_listing(server: &MockServer, tags: &str, page: u32, ids: impl IntoIterator<Item = u32>) {
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("page", page.to_string()))
        .and(query_param("tags", tags))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(server, ids))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a detail page and its image
async fn mount_post(server: &MockServer, id: u32, tags: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_html(id, tags))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/data/original/{}.jpg", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("image-{}", id).into_bytes()))
        .mount(server)
        .await;
}

/// Any listing page not mounted explicitly is empty
async fn mount_empty_listing_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_downloads_images_and_captions() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    mount_listing(&mock_server, "blue_sky", 1, 1..=5).await;
    for id in 1..=5 {
        mount_post(&mock_server, id, &["blue sky", "cloud"]).await;
    }

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path()))
        .expect("Failed to create coordinator");
    let progress = coordinator
        .run(create_job(&["blue_sky"], 3))
        .await
        .expect("Crawl failed");

    assert_eq!(progress.downloaded(), 3);
    assert_eq!(progress.skipped(), 0);
    assert_eq!(progress.processed_links(), 3);
    assert!(!progress.is_terminated());

    let project_dir = temp.path().join("sky");
    for n in 1..=3 {
        let image = std::fs::read(project_dir.join(format!("sky_{}.jpg", n))).unwrap();
        assert_eq!(image, format!("image-{}", n).into_bytes());

        let caption = std::fs::read_to_string(project_dir.join(format!("sky_{}.txt", n))).unwrap();
        assert_eq!(caption, "blue_sky, cloud");
    }
    assert!(!project_dir.join("sky_4.jpg").exists());
}

#[tokio::test]
async fn test_two_search_tags_are_space_joined() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    mount_listing(&mock_server, "blue_sky cloud", 1, [7]).await;
    mount_post(&mock_server, 7, &["blue_sky", "cloud"]).await;
    mount_empty_listing_fallback(&mock_server).await;

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path())).unwrap();
    let progress = coordinator
        .run(create_job(&["blue_sky", "cloud"], 5))
        .await
        .unwrap();

    assert_eq!(progress.downloaded(), 1);
    assert!(!progress.is_terminated());
    assert!(temp.path().join("sky").join("sky_1.jpg").exists());

    // A quota under one full page crawls page 1 only
    let listing_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/posts")
        .count();
    assert_eq!(listing_requests, 1);
}

#[tokio::test]
async fn test_rate_limited_listing_is_retried() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    // First two listing requests are rate limited
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_listing(&mock_server, "blue_sky", 1, [1, 2]).await;
    mount_post(&mock_server, 1, &["blue_sky"]).await;
    mount_post(&mock_server, 2, &["blue_sky"]).await;
    mount_empty_listing_fallback(&mock_server).await;

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path())).unwrap();
    let progress = coordinator.run(create_job(&["blue_sky"], 2)).await.unwrap();

    assert_eq!(progress.downloaded(), 2);
    assert_eq!(progress.total_pages(), 1);

    let listing_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/posts")
        .count();
    assert_eq!(listing_requests, 3);
}

#[tokio::test]
async fn test_filters_and_failed_downloads_are_skipped() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    mount_listing(&mock_server, "blue_sky", 1, 1..=4).await;
    mount_post(&mock_server, 1, &["blue_sky", "rain"]).await;
    mount_post(&mock_server, 2, &["blue_sky"]).await;
    mount_post(&mock_server, 4, &["blue_sky"]).await;
    // Post 3 is accepted but its image is gone
    Mock::given(method("GET"))
        .and(path("/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_html(3, &["blue_sky"])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/data/original/3\.jpg$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_empty_listing_fallback(&mock_server).await;

    let mut job = create_job(&["blue_sky"], 10);
    job.ignore_tags.insert("rain".to_string());

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path())).unwrap();
    let progress = coordinator.run(job).await.unwrap();

    assert_eq!(progress.processed_links(), 4);
    assert_eq!(progress.downloaded(), 2);
    assert_eq!(progress.skipped(), 2);
    assert!(!progress.is_terminated());

    // Filtered posts take no file number; the failed download consumed number 2
    let project_dir = temp.path().join("sky");
    assert_eq!(std::fs::read(project_dir.join("sky_1.jpg")).unwrap(), b"image-2");
    assert!(!project_dir.join("sky_2.jpg").exists());
    assert_eq!(std::fs::read(project_dir.join("sky_3.jpg")).unwrap(), b"image-4");
}

#[tokio::test]
async fn test_parallel_sweep_fills_large_quota() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    mount_listing(&mock_server, "blue_sky", 1, 1..=20).await;
    mount_listing(&mock_server, "blue_sky", 2, 101..=120).await;
    mount_listing(&mock_server, "blue_sky", 3, 201..=220).await;
    for id in (1..=20).chain(101..=120).chain(201..=220) {
        mount_post(&mock_server, id, &["blue_sky"]).await;
    }

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path())).unwrap();
    let progress = coordinator.run(create_job(&["blue_sky"], 45)).await.unwrap();

    assert_eq!(progress.downloaded(), 45);
    assert_eq!(progress.total_pages(), 3);
    assert_eq!(progress.completed_pages(), 2);

    let images = std::fs::read_dir(temp.path().join("sky"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "jpg"))
        .count();
    assert_eq!(images, 45);
}

#[tokio::test]
async fn test_empty_board_terminates_without_downloads() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_empty_listing_fallback(&mock_server).await;

    let coordinator = Coordinator::new(create_test_settings(&mock_server, temp.path())).unwrap();
    let progress = coordinator.run(create_job(&["blue_sky"], 100)).await.unwrap();

    assert!(progress.is_terminated());
    assert_eq!(progress.downloaded(), 0);
    assert_eq!(progress.total_pages(), 0);
    assert!(temp.path().join("sky").is_dir());
}

#[tokio::test]
async fn test_downloader_derives_file_name_for_directory() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/media/cat.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"webp".to_vec()))
        .mount(&mock_server)
        .await;

    let downloader = HttpDownloader::new(reqwest::Client::new());
    let url = format!("{}/media/cat.webp?download=1", mock_server.uri());
    let saved = downloader.download(temp.path(), &url).await.unwrap();

    assert_eq!(saved, temp.path().join("cat.webp"));
    assert_eq!(std::fs::read(saved).unwrap(), b"webp");
}

#[tokio::test]
async fn test_downloader_rejects_error_status() {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let downloader = HttpDownloader::new(reqwest::Client::new());
    let dest = temp.path().join("nested").join("sky_1.png");
    let result = downloader
        .download(&dest, &format!("{}/media/1.png", mock_server.uri()))
        .await;

    assert!(result.is_err());
    assert!(!dest.exists());
}

/// Serves one response whose body stops short of its declared length
async fn serve_truncated_body() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial")
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });
    format!("http://{}/media/1.jpg", addr)
}

#[tokio::test]
async fn test_downloader_removes_truncated_file() {
    let temp = TempDir::new().unwrap();
    let url = serve_truncated_body().await;
    let dest = temp.path().join("sky").join("sky_1.jpg");

    let result = HttpDownloader::new(reqwest::Client::new())
        .download(&dest, &url)
        .await;

    assert!(result.is_err());
    assert!(dest.parent().unwrap().is_dir());
    assert!(!dest.exists());
}
