//! Tag filter applied to every post before it is downloaded

use crate::config::Job;
use std::collections::BTreeSet;

/// Outcome of filtering one post's tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    /// The post carries an ignored tag
    Ignored(String),
    /// The post lacks a required tag
    MissingRequired(String),
}

impl FilterDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Accept/reject policy built from a job's `and` and `ignore` lists
///
/// Matching is exact string equality on normalized tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    required: BTreeSet<String>,
    ignored: BTreeSet<String>,
}

impl TagFilter {
    pub fn new(required: BTreeSet<String>, ignored: BTreeSet<String>) -> Self {
        Self { required, ignored }
    }

    pub fn from_job(job: &Job) -> Self {
        Self::new(job.and_tags.clone(), job.ignore_tags.clone())
    }

    /// Decides whether a post with these tags is kept
    ///
    /// Ignored tags are checked first; required tags only matter when the
    /// post has none of them.
    pub fn evaluate(&self, tags: &[String]) -> FilterDecision {
        let present: BTreeSet<&str> = tags.iter().map(String::as_str).collect();

        if let Some(tag) = self.ignored.iter().find(|t| present.contains(t.as_str())) {
            return FilterDecision::Ignored(tag.clone());
        }

        if let Some(tag) = self.required.iter().find(|t| !present.contains(t.as_str())) {
            return FilterDecision::MissingRequired(tag.clone());
        }

        FilterDecision::Accept
    }
}
