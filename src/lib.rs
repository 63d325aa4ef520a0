//! # Tiles-dl
//!
//! Bulk harvester for the mahjong tile images of a MediaWiki site.
//!
//! Every tile in the [`Catalog`] has a `File:` page on the wiki. For each
//! tile and each [`SelectorVariant`] the harvester fetches the page, picks
//! the image out of it with a CSS selector and streams the image into
//! `<save-dir>/<category>/`.
//!
//! ```no_run
//! # async fn example() -> tiles_dl::Result<()> {
//! let report = tiles_dl::harvest().await?;
//! println!("{} downloaded, {} failed", report.succeeded, report.failed);
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use crate::core::catalog::{Catalog, Category};
pub use crate::core::error::{Error, FetchStep, Result};
pub use crate::core::harvester::{Harvester, PlannedDownload};
pub use crate::core::options::{DownloadOptions, ProgressCallback};
pub use crate::core::pool::{RunReport, TaskHandler, TaskOutcome, WorkerPool};
pub use crate::core::source::{resolve_base_directory, SourceConfig, TileRef};
pub use crate::core::task::{default_selectors, plan_tasks, DownloadTask, SelectorVariant};

/// Harvest the built-in catalog from the default wiki with default options
pub async fn harvest() -> Result<RunReport> {
    harvest_with_options(DownloadOptions::default()).await
}

/// Harvest the built-in catalog from the default wiki
pub async fn harvest_with_options(options: DownloadOptions) -> Result<RunReport> {
    Harvester::new(Catalog::default(), SourceConfig::default(), options)?
        .run()
        .await
}
