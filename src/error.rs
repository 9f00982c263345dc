//! Error types for Favro export operations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while exporting a Favro account.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration is missing or incomplete.
    #[error("Favro configuration required: {0}")]
    ConfigMissing(String),

    /// API request returned a status outside the accepted set.
    #[error("Favro API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Rate limited (HTTP 429).
    #[error("Rate limited, quota resets at {reset_at:?}")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing or serialization error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Filesystem error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Attachment URL answered with a non-success status.
    #[error("Download of {url} failed with HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    /// Value that cannot be sent as an HTTP header.
    #[error("Invalid header value '{0}'")]
    InvalidHeader(String),

    /// Attachment entry that cannot be stored (missing URL, missing or unusable name).
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
}

impl ExportError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for export operations.
pub type Result<T> = core::result::Result<T, ExportError>;
