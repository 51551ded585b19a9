//! HTTP client for the Synapsis server.

use crate::model::{
    AskAiRequest, ClientConfig, ErrorBody, HealthStatus, ModeCatalog, SaveRequest,
    SubmissionResult,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::error::Error as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Application { status: u16, detail: Option<String> },
    /// The request never produced a usable response.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest keeps the useful part (connection refused, dns, ...) in the source chain.
        let mut msg = e.to_string();
        let mut source = e.source();
        while let Some(s) = source {
            msg.push_str(": ");
            msg.push_str(&s.to_string());
            source = s.source();
        }
        ApiError::Transport(msg)
    }
}

/// The three endpoints the UI controller talks to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_modes(&self) -> Result<ModeCatalog, ApiError>;
    async fn save(&self, req: &SaveRequest) -> Result<SubmissionResult, ApiError>;
    async fn ask_ai(&self, req: &AskAiRequest) -> Result<SubmissionResult, ApiError>;
}

pub struct SynapsisClient {
    http: reqwest::Client,
    base_url: String,
}

impl SynapsisClient {
    pub fn new(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        read_json(resp).await
    }
}

#[async_trait]
impl Backend for SynapsisClient {
    async fn fetch_modes(&self) -> Result<ModeCatalog, ApiError> {
        tracing::debug!(url = %self.url("/modes"), "fetching mode catalog");
        let resp = self.http.get(self.url("/modes")).send().await?;
        let catalog: ModeCatalog = read_json(resp).await?;
        tracing::info!(
            modes = catalog.modes.len(),
            default = %catalog.default_mode_id,
            "mode catalog loaded"
        );
        Ok(catalog)
    }

    async fn save(&self, req: &SaveRequest) -> Result<SubmissionResult, ApiError> {
        tracing::debug!(bytes = req.content.len(), "POST /save");
        let resp = self.http.post(self.url("/save")).json(req).send().await?;
        read_json(resp).await
    }

    async fn ask_ai(&self, req: &AskAiRequest) -> Result<SubmissionResult, ApiError> {
        tracing::debug!(bytes = req.content.len(), mode = %req.mode_id, "POST /ask-ai");
        let resp = self.http.post(self.url("/ask-ai")).json(req).send().await?;
        read_json(resp).await
    }
}

/// Decode a JSON body, mapping non-2xx statuses to [`ApiError::Application`].
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        // A missing or unparsable error body still counts as an application error.
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "server returned an error");
        return Err(ApiError::Application {
            status: status.as_u16(),
            detail: body.detail_text(),
        });
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Transport(format!("invalid JSON response: {e}")))
}
