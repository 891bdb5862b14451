//! Error types used by the crate.

use hazardmap_types::{GeometryKind, TypesError};
use hazardmap_vt::TilingError;
use thiserror::Error;

/// Hazard map error type.
#[derive(Debug, Error)]
pub enum HazardMapError {
    /// Transport failure (connection refused, DNS, broken body stream).
    #[error("failed to load data: {0}")]
    Io(String),
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        /// Requested url.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request did not complete in the configured time.
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested url.
        url: String,
    },
    /// The response body could not be parsed.
    #[error("failed to decode data: {0}")]
    Decoding(String),
    /// Coordinate reference problem: unknown or invalid reference, or a coordinate that cannot
    /// be projected.
    #[error("coordinate reference error: {0}")]
    Crs(#[from] TypesError),
    /// No style is defined for the geometry kind, neither for the dataset nor in the default set.
    #[error("no style for {kind} features (dataset: {})", dataset.as_deref().unwrap_or("<default>"))]
    MissingStyle {
        /// Kind of the geometry.
        kind: GeometryKind,
        /// Dataset style set that was requested.
        dataset: Option<String>,
    },
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Error reading data from the file system.
    #[error("failed to read file")]
    FsIo(#[from] std::io::Error),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for HazardMapError {
    fn from(value: reqwest::Error) -> Self {
        let url = value.url().map(|url| url.to_string()).unwrap_or_default();
        if value.is_timeout() {
            return Self::Timeout { url };
        }

        match value.status() {
            Some(status) => Self::HttpStatus {
                url,
                status: status.as_u16(),
            },
            None if value.is_decode() => Self::Decoding(value.to_string()),
            None => Self::Io(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for HazardMapError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

impl From<TilingError> for HazardMapError {
    fn from(value: TilingError) -> Self {
        Self::Generic(value.to_string())
    }
}
