/*!
 * Bibliographic search providers.
 *
 * This module contains client implementations for the services used to
 * resolve a paper title to a downloadable PDF:
 * - Semantic Scholar: Graph API paper search (primary)
 * - arXiv: Atom query API (fallback)
 */

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Outcome of a single title lookup
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchResult {
    /// Whether the service returned a matching paper
    pub found: bool,
    /// Direct PDF link, when the service knows one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Title as reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author names as reported by the service
    pub authors: Vec<String>,
    /// Name of the service that produced this result
    pub source: String,
    /// Error text when the lookup failed rather than came back empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    /// A lookup that found nothing
    pub fn not_found(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// A lookup that failed with an error
    pub fn failed(source: impl Into<String>, error: &ProviderError) -> Self {
        Self {
            source: source.into(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Found and carries a PDF link
    pub fn has_pdf(&self) -> bool {
        self.found && self.pdf_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Common trait for all search providers
///
/// Implementations must report "no match" as `Ok` with `found == false` and
/// reserve `Err` for transport or protocol failures.
#[async_trait]
pub trait SearchProvider: Send + Sync + Debug {
    /// Stable identifier used in reports (e.g. `semantic_scholar`)
    fn name(&self) -> &str;

    /// Look up a paper by title
    async fn search(&self, title: &str) -> Result<SearchResult, ProviderError>;
}

/// Build a shared HTTP client with the given request timeout
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(concat!("bestpapers/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Map a reqwest failure onto the provider error taxonomy
pub(crate) fn request_error(error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

pub mod arxiv;
pub mod semantic_scholar;
