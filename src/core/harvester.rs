//! High-level harvester tying the catalog, the wiki and the worker pool
//! together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use log::info;
use reqwest::Client;
use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::downloader::{build_client, Downloader};
use crate::core::error::{Error, Result};
use crate::core::extract::fetch_image_url;
use crate::core::options::DownloadOptions;
use crate::core::pool::{RunReport, TaskHandler, WorkerPool};
use crate::core::source::{resolve_base_directory, SourceConfig};
use crate::core::task::{plan_tasks, DownloadTask};

/// Where a planned task reads from and writes to
#[derive(Debug, Clone, Serialize)]
pub struct PlannedDownload {
    #[serde(flatten)]
    pub task: DownloadTask,
    pub page_url: String,
    pub destination: PathBuf,
}

/// Everything a worker needs to run one task
struct TaskContext {
    catalog: Catalog,
    source: SourceConfig,
    client: Client,
    downloader: Downloader,
    base_dir: PathBuf,
}

impl TaskContext {
    /// Fetch the tile page, extract the image path and save the image
    async fn process(&self, task: &DownloadTask) -> Result<PathBuf> {
        let page_url = self.source.page_url(&self.catalog, &task.tile)?;
        let image_path = fetch_image_url(&self.client, &page_url, &task.variant.selector).await?;
        let file_name = self
            .source
            .file_name(&self.catalog, &task.tile, task.variant.thumbnail)?;
        let dir = self.source.destination_dir(&self.base_dir, &task.tile);

        let path = self.downloader.download(&image_path, &dir, &file_name).await?;
        info!("Downloaded {} to {}", image_path, path.display());
        Ok(path)
    }
}

/// Harvests every tile of a catalog from the wiki
pub struct Harvester {
    context: Arc<TaskContext>,
    options: DownloadOptions,
}

impl Harvester {
    /// Validate the options, resolve the output directory and build the HTTP
    /// client. Nothing is written yet.
    pub fn new(catalog: Catalog, source: SourceConfig, options: DownloadOptions) -> Result<Self> {
        options.validate()?;
        let base_dir = resolve_base_directory(&options.save_dir)?;
        let client = build_client(&options)?;
        let downloader = Downloader::new(client.clone(), source.clone());

        Ok(Self {
            context: Arc::new(TaskContext {
                catalog,
                source,
                client,
                downloader,
                base_dir,
            }),
            options,
        })
    }

    /// Absolute output directory, with `/` separators
    pub fn base_dir(&self) -> &Path {
        &self.context.base_dir
    }

    /// All tasks of the run, in dispatch order
    pub fn plan(&self) -> Result<Vec<DownloadTask>> {
        plan_tasks(&self.context.catalog, &self.options.selectors)
    }

    /// Resolve a task to its page URL and destination without fetching
    pub fn describe(&self, task: &DownloadTask) -> Result<PlannedDownload> {
        let ctx = &self.context;
        let page_url = ctx.source.page_url(&ctx.catalog, &task.tile)?;
        let file_name = ctx
            .source
            .file_name(&ctx.catalog, &task.tile, task.variant.thumbnail)?;
        let destination = ctx.source.destination_dir(&ctx.base_dir, &task.tile).join(file_name);
        Ok(PlannedDownload {
            task: task.clone(),
            page_url,
            destination,
        })
    }

    /// Run a single task in the calling task
    pub async fn run_task(&self, task: &DownloadTask) -> Result<PathBuf> {
        self.context.process(task).await
    }

    /// Create the output directory and run every task through the pool
    pub async fn run(&self) -> Result<RunReport> {
        let base_dir = self.base_dir();
        tokio::fs::create_dir_all(base_dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: base_dir.to_path_buf(),
                source,
            })?;

        let tasks = self.plan()?;
        info!(
            "Harvesting {} images into {} with {} workers",
            tasks.len(),
            base_dir.display(),
            self.options.workers
        );

        let context = Arc::clone(&self.context);
        let handler: TaskHandler = Arc::new(move |task: DownloadTask| {
            let context = Arc::clone(&context);
            async move { context.process(&task).await }.boxed()
        });

        WorkerPool::from_options(&self.options)?.run(tasks, handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Category;
    use crate::core::source::TileRef;
    use crate::core::task::SelectorVariant;
    use tempfile::tempdir;

    fn harvester_in(dir: &Path) -> Harvester {
        let options = DownloadOptions {
            save_dir: dir.to_path_buf(),
            ..Default::default()
        };
        Harvester::new(Catalog::default(), SourceConfig::default(), options).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_workers() {
        let options = DownloadOptions {
            workers: 0,
            ..Default::default()
        };
        let result = Harvester::new(Catalog::default(), SourceConfig::default(), options);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_plan_size() {
        let temp_dir = tempdir().unwrap();
        assert_eq!(harvester_in(temp_dir.path()).plan().unwrap().len(), 76);
    }

    #[test]
    fn test_describe_indexed_thumbnail() {
        let temp_dir = tempdir().unwrap();
        let harvester = harvester_in(temp_dir.path());
        let task = DownloadTask::new(TileRef::indexed(Category::P, 3), SelectorVariant::history_thumbnail());

        let planned = harvester.describe(&task).unwrap();
        assert_eq!(
            planned.page_url,
            "http://wiki.lingshangkaihua.com/mediawiki/index.php/File:3p.png"
        );
        assert_eq!(planned.destination, harvester.base_dir().join("p").join("thumb_3p.png"));
    }

    #[test]
    fn test_describe_other() {
        let temp_dir = tempdir().unwrap();
        let harvester = harvester_in(temp_dir.path());
        let task = DownloadTask::new(TileRef::other("B"), SelectorVariant::full_image());

        let planned = harvester.describe(&task).unwrap();
        assert_eq!(planned.destination, harvester.base_dir().join("other").join("B.png"));
    }

    #[tokio::test]
    async fn test_run_task_rejects_out_of_range_tile() {
        let temp_dir = tempdir().unwrap();
        let harvester = harvester_in(temp_dir.path());
        let task = DownloadTask::new(TileRef::indexed(Category::Z, 9), SelectorVariant::full_image());

        let result = harvester.run_task(&task).await;
        assert!(matches!(result, Err(Error::InvalidIndex { index: 9, .. })));
    }
}
