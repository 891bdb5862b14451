use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;

use crate::error::HazardMapError;
use crate::platform::{DataRequest, PlatformService};

const USER_AGENT: &str = concat!("hazardmap/", env!("CARGO_PKG_VERSION"));

/// Platform service using `reqwest` for remote locations and `tokio::fs` for local files.
#[derive(Debug, Clone)]
pub struct NativePlatformService {
    http_client: reqwest::Client,
}

impl NativePlatformService {
    /// Creates a new service. Requests taking longer than `timeout` fail with
    /// [`HazardMapError::Timeout`].
    pub fn new(timeout: Duration) -> Result<Self, HazardMapError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http_client })
    }

    async fn load_from_web(&self, request: &DataRequest) -> Result<Bytes, HazardMapError> {
        let url = &request.url;
        let builder = match &request.body {
            Some(body) => self.http_client.post(url).json(body),
            None => self.http_client.get(url),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("Failed to load {url}: {status}");
            return Err(HazardMapError::HttpStatus {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }

    async fn load_from_file(&self, request: &DataRequest) -> Result<Bytes, HazardMapError> {
        let path = request
            .url
            .strip_prefix("file://")
            .unwrap_or(&request.url);
        if request.body.is_some() {
            return Err(HazardMapError::Config(format!(
                "cannot send a request body to the local file {path}"
            )));
        }

        Ok(Bytes::from(tokio::fs::read(path).await?))
    }
}

#[async_trait]
impl PlatformService for NativePlatformService {
    async fn fetch(&self, request: &DataRequest) -> Result<Bytes, HazardMapError> {
        let bytes = if request.is_remote() {
            self.load_from_web(request).await?
        } else {
            self.load_from_file(request).await?
        };

        debug!("Loaded {} bytes from {}", bytes.len(), request.url);
        Ok(bytes)
    }
}
