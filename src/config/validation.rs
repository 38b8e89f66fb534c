use crate::config::types::{
    Config, CrawlerConfig, Job, JobSpec, DEFAULT_MEDIA_COUNT, MAX_MEDIA_COUNT, MAX_SEARCH_TAGS,
    MIN_MEDIA_COUNT,
};
use crate::ConfigError;
use std::collections::BTreeSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    if let Some(spec) = &config.job {
        validate_job(&normalize_job(spec.clone()))?;
    }
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.page_capacity < 1 {
        return Err(ConfigError::Validation(
            "page-capacity must be >= 1".to_string(),
        ));
    }

    for (name, value) in [
        ("page-workers", config.page_workers),
        ("link-workers", config.link_workers),
    ] {
        if !(1..=100).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, value
            )));
        }
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.output_root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks a normalized job before any crawl work starts
pub fn validate_job(job: &Job) -> Result<(), ConfigError> {
    validate_search_tags(&job.tags)?;
    validate_project_name(&job.project)?;
    Ok(())
}

/// Rejects jobs with more search tags than the listing endpoint accepts
pub fn validate_search_tags(tags: &[String]) -> Result<(), ConfigError> {
    if tags.len() > MAX_SEARCH_TAGS {
        return Err(ConfigError::TooManyTags {
            count: tags.len(),
            max: MAX_SEARCH_TAGS,
        });
    }
    Ok(())
}

/// Project names become directory names under the output root
pub fn validate_project_name(project: &str) -> Result<(), ConfigError> {
    if project.trim().is_empty() {
        return Err(ConfigError::Validation(
            "project cannot be empty".to_string(),
        ));
    }

    if project == "." || project == ".." || project.contains(|c: char| c == '/' || c == '\\') {
        return Err(ConfigError::Validation(format!(
            "project '{}' must be a plain directory name",
            project
        )));
    }

    Ok(())
}

/// Builds a [`Job`] from its raw description
///
/// Tags are trimmed and spaces become underscores, matching how the board
/// renders tag names. Empty entries are dropped.
pub fn normalize_job(spec: JobSpec) -> Job {
    Job {
        project: spec.project.trim().to_string(),
        tags: spec.tags.iter().filter_map(|t| normalize_tag(t)).collect(),
        and_tags: normalize_tag_set(&spec.and),
        ignore_tags: normalize_tag_set(&spec.ignore),
        requested_media: clamp_media_count(spec.media_count),
    }
}

/// Normalizes a single tag, returning None for blank input
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.replace(' ', "_"))
    }
}

fn normalize_tag_set(tags: &[String]) -> BTreeSet<String> {
    tags.iter().filter_map(|t| normalize_tag(t)).collect()
}

/// Clamps a requested media count into the supported range
///
/// Missing or zero counts fall back to the default.
pub fn clamp_media_count(requested: Option<i64>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_MEDIA_COUNT,
        Some(n) if n < MIN_MEDIA_COUNT as i64 => MIN_MEDIA_COUNT,
        Some(n) if n > MAX_MEDIA_COUNT as i64 => MAX_MEDIA_COUNT,
        Some(n) => n as u32,
    }
}
