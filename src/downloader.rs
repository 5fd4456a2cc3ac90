/*!
 * PDF download with existence check.
 *
 * Downloads are idempotent: a file that is already present and larger than a
 * small threshold is reported as already existing and not fetched again.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::debug;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::DownloadError;
use crate::file_utils::FileManager;

/// How a download request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// The file was fetched and written
    Downloaded,
    /// A sufficiently large file was already present
    AlreadyExisted,
}

/// Streams PDFs into an output directory
#[derive(Debug, Clone)]
pub struct Downloader {
    output_dir: PathBuf,
    /// Existing files at or below this size are downloaded again
    min_existing_bytes: u64,
    client: Client,
}

impl Downloader {
    /// Create a downloader writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, min_existing_bytes: u64, timeout_secs: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            min_existing_bytes,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination path for a file name
    pub fn target_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Whether `filename` already satisfies a download
    pub fn already_present(&self, filename: &str) -> bool {
        FileManager::file_larger_than(self.target_path(filename), self.min_existing_bytes)
    }

    /// Download `pdf_url` to `filename` unless it is already present
    pub async fn download(&self, pdf_url: &str, filename: &str) -> Result<DownloadStatus, DownloadError> {
        if self.already_present(filename) {
            debug!("Already exists: {}", filename);
            return Ok(DownloadStatus::AlreadyExisted);
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.target_path(filename);

        let result = self.stream_to_file(pdf_url, &path).await;
        if result.is_err() {
            // Leave no partial file behind, it would count as present on the next run
            let _ = tokio::fs::remove_file(&path).await;
        }
        result.map(|_| DownloadStatus::Downloaded)
    }

    async fn stream_to_file(&self, pdf_url: &str, path: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(pdf_url)
            .send()
            .await
            .map_err(|e| DownloadError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status_code: status.as_u16(),
            });
        }

        let mut file = File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk.map_err(|e| DownloadError::Request(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {} bytes to {:?}", written, path);
        Ok(written)
    }
}
