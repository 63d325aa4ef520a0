//! Run-wide options for a harvest

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::error::{Error, Result};
use crate::core::task::{default_selectors, validate_selectors, SelectorVariant};

/// Progress callback, called with `(finished, total)` task counts
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for a harvest run
#[derive(Clone)]
pub struct DownloadOptions {
    /// Output directory, relative to the working directory unless absolute
    pub save_dir: PathBuf,

    /// Number of concurrent workers
    pub workers: usize,

    /// Capacity of the task queue between producer and workers
    pub queue_capacity: usize,

    /// Images pulled from every tile page
    pub selectors: Vec<SelectorVariant>,

    /// TCP connect deadline per request
    pub connect_timeout: Duration,

    /// Overall deadline per request, body included
    pub request_timeout: Duration,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,

    /// Stops the run early when cancelled
    pub cancel: CancellationToken,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("images"),
            workers: 4,
            queue_capacity: 100,
            selectors: default_selectors(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl DownloadOptions {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidInput("worker count must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidInput("queue capacity must be at least 1".to_string()));
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(Error::InvalidInput("timeouts must be greater than zero".to_string()));
        }
        validate_selectors(&self.selectors)
    }
}
