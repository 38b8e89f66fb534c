//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Progress`: atomic counters updated by crawl workers and read by observers
//! - `ProgressSnapshot`: a plain copy of those counters for reporting
//! - `RunStatus`: the Idle / Running / Completed label kept by a control layer

mod progress;
mod run_status;

// Re-export main types
pub use progress::{Progress, ProgressSnapshot};
pub use run_status::RunStatus;
