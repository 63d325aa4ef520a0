//! Image download to disk
//!
//! Streams an image into its destination file. Directory creation, the HTTP
//! response and the file handle all live inside a single call.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use reqwest::{Client, ClientBuilder};
use tokio::io::AsyncWriteExt;

use crate::core::error::{Error, Result};
use crate::core::options::DownloadOptions;
use crate::core::source::SourceConfig;
use crate::core::stream::create_http_stream;

/// Build the HTTP client shared by every worker
pub fn build_client(options: &DownloadOptions) -> Result<Client> {
    ClientBuilder::new()
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .pool_max_idle_per_host(options.workers)
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .user_agent(format!("tiles-dl/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::InvalidInput(format!("could not build HTTP client: {e}")))
}

/// Writes extracted images into the output tree
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    config: SourceConfig,
}

impl Downloader {
    pub fn new(client: Client, config: SourceConfig) -> Self {
        Self { client, config }
    }

    /// Download `image_path` (as found on the page) to `dir/file_name`,
    /// creating `dir` if needed. Returns the written path.
    ///
    /// The response status is not checked: whatever the server sends is
    /// written through.
    pub async fn download(&self, image_path: &str, dir: &Path, file_name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })?;

        let url = self.config.image_url(image_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Error::image_fetch)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Image request {url} answered {status}, writing the body anyway");
        }

        let path = dir.join(file_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|source| Error::FileCreate {
                path: path.clone(),
                source,
            })?;

        let mut body = create_http_stream(response);
        let written = tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
        file.flush().await.map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

        debug!("Wrote {written} bytes to {}", path.display());
        Ok(path)
    }
}
