/*!
 * Error types for the bestpapers application.
 *
 * This module contains custom error types for the network-facing stages of the
 * pipeline, using the thiserror crate for ergonomic error definitions. The
 * README parser has no error type: malformed input degrades to empty sections.
 */

use thiserror::Error;

/// Errors that can occur when querying a bibliographic search service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors that can occur while retrieving the source document
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("Failed to fetch {url} - Status: {status_code}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Requested URL
        url: String,
    },

    /// The request could not be completed
    #[error("Error fetching document: {0}")]
    Request(String),

    /// Reading a local document failed
    #[error("Error reading document: {0}")]
    Io(String),
}

/// Errors that can occur while downloading a PDF
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The server answered with a non-success status
    #[error("HTTP status {status_code}")]
    Status {
        /// HTTP status code
        status_code: u16,
    },

    /// The request or the body stream failed
    #[error("Request error: {0}")]
    Request(String),

    /// Writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a search provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error retrieving the source document
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error downloading a PDF
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
