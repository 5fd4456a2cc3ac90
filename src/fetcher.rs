/*!
 * Source document retrieval.
 *
 * The README can come from a URL (usually the raw GitHub file) or from a
 * local path, which makes offline re-runs and testing possible.
 */

use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use reqwest::Client;

use crate::errors::FetchError;
use crate::file_utils::FileManager;

/// Where the README is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(String),
    File(String),
}

impl DocumentSource {
    /// Classify a configured source string
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(source.to_string())
        }
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path),
        }
    }
}

/// Retrieve the raw README text
pub async fn fetch_document(source: &DocumentSource, timeout_secs: u64) -> Result<String, FetchError> {
    match source {
        DocumentSource::Url(url) => fetch_url(url, timeout_secs).await,
        DocumentSource::File(path) => {
            debug!("Reading document from {}", path);
            FileManager::read_to_string(Path::new(path)).map_err(|e| FetchError::Io(format!("{:#}", e)))
        }
    }
}

async fn fetch_url(url: &str, timeout_secs: u64) -> Result<String, FetchError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status_code: status.as_u16(),
            url: url.to_string(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    info!("Fetched {} bytes from {}", text.len(), url);
    Ok(text)
}
