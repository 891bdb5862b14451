//! Provides platform specific logic and [`PlatformService`] to access it.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::error::HazardMapError;

/// Platform service of native targets: HTTP through `reqwest` and local files through `tokio`.
pub mod native;

/// Default implementation of the [`PlatformService`] for the current platform.
pub type PlatformServiceImpl = native::NativePlatformService;

/// A data request: `GET` of the location, or `POST` of a JSON body to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRequest {
    /// Absolute URL or local file path.
    pub url: String,
    /// JSON body. If set, the request is sent as `POST`.
    pub body: Option<Value>,
}

impl DataRequest {
    /// `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: None,
        }
    }

    /// `POST` request with the JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            body: Some(body),
        }
    }

    /// True if the location is an `http(s)` URL, false if it is a local path.
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// Service fetching data for the viewer.
///
/// The viewer never talks to the network directly, so the service can be replaced, for example
/// with an in-memory one in tests.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Fetches the content of the location.
    ///
    /// Must return [`HazardMapError::HttpStatus`] for non-success responses and
    /// [`HazardMapError::Timeout`] if the request took too long.
    async fn fetch(&self, request: &DataRequest) -> Result<Bytes, HazardMapError>;
}
