//! CLI-specific progress handling for tiles-dl
//!
//! Renders the pool's completion count as a progress bar on stderr.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tiles_dl::ProgressCallback;

/// Creates a progress bar counting finished tasks
pub fn create_progress_bar(total_tasks: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_tasks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} images ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for a harvest run
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_tasks: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_tasks);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }

    /// Callback for the worker pool that advances the bar
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |finished, total| {
            if pb.length().unwrap_or(0) != total {
                pb.set_length(total);
            }
            pb.set_position(finished);
        })
    }

    pub fn finish(&self, message: &'static str) {
        self.pb.finish_with_message(message);
    }
}
