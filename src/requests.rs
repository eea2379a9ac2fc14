use bytes::Bytes;
use reqwest::{Client, ClientBuilder, Response};

use crate::error::{PipelineError, PipelineResult};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around reqwest that turns non-2xx answers into errors.
#[derive(Clone)]
pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    pub fn new() -> PipelineResult<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub async fn fetch_url_response(&self, url: &str) -> PipelineResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::fetch(url, e))?;
        response
            .error_for_status()
            .map_err(|e| PipelineError::fetch(url, e))
    }

    pub async fn fetch_url_body(&self, url: &str) -> PipelineResult<String> {
        let response = self.fetch_url_response(url).await?;
        response.text().await.map_err(|e| PipelineError::fetch(url, e))
    }

    pub async fn fetch_url_bytes(&self, url: &str) -> PipelineResult<Bytes> {
        let response = self.fetch_url_response(url).await?;
        response.bytes().await.map_err(|e| PipelineError::fetch(url, e))
    }
}
