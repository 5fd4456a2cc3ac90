use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchProvider, SearchResult, http_client, request_error};
use crate::errors::ProviderError;

/// Identifier reported in search results
pub const SOURCE: &str = "semantic_scholar";

/// Fields requested from the paper search endpoint
const SEARCH_FIELDS: &str = "title,authors,openAccessPdf,externalIds";

/// Semantic Scholar Graph API client
#[derive(Debug)]
pub struct SemanticScholar {
    /// Base URL of the Graph API (e.g. `https://api.semanticscholar.org/graph/v1`)
    endpoint: String,
    /// Optional API key sent as `x-api-key`
    api_key: Option<String>,
    client: Client,
}

/// Paper search response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<PaperHit>,
}

/// One paper in a search response
#[derive(Debug, Deserialize)]
pub struct PaperHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<AuthorHit>,
    #[serde(rename = "openAccessPdf", default)]
    pub open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorHit {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAccessPdf {
    #[serde(default)]
    pub url: Option<String>,
}

impl SemanticScholar {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(timeout_secs),
        }
    }

    /// Convert a parsed response into a search result
    pub fn result_from_response(response: SearchResponse) -> SearchResult {
        let Some(paper) = response.data.into_iter().next() else {
            return SearchResult::not_found(SOURCE);
        };

        let pdf_url = paper
            .open_access_pdf
            .and_then(|pdf| pdf.url)
            .filter(|url| !url.is_empty());

        SearchResult {
            found: true,
            pdf_url,
            title: Some(paper.title.unwrap_or_default()),
            authors: paper
                .authors
                .into_iter()
                .map(|a| a.name.unwrap_or_default())
                .collect(),
            source: SOURCE.to_string(),
            error: None,
        }
    }
}

#[async_trait]
impl SearchProvider for SemanticScholar {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn search(&self, title: &str) -> Result<SearchResult, ProviderError> {
        let url = format!("{}/paper/search", self.endpoint);

        let mut request = self
            .client
            .get(&url)
            .query(&[("query", title), ("limit", "1"), ("fields", SEARCH_FIELDS)]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();

        if !status.is_success() {
            // The service reports unknown queries with an empty result set, so any
            // other status is a real failure
            let message = response.text().await.unwrap_or_default();
            debug!("Semantic Scholar returned {} for '{}'", status, title);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(Self::result_from_response(body))
    }
}
