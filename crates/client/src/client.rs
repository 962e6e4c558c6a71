//! HTTP client for the gateway API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};

use agent_gateway_core::types::{
    AgentSummary, ArtifactLink, ExecutionEnvelope, ExecutionRequest, OptionDef,
};

use crate::error::{ClientError, Result};

/// Agent runs can take minutes; the gateway enforces its own limit.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
struct AgentList {
    agents: Vec<AgentSummary>,
}

#[derive(Deserialize)]
struct OptionList {
    options: Vec<OptionDef>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Client for a gateway at `base_url`, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Self::with_http(http, base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        let list: AgentList = self.get_json("/api/agents").await?;
        Ok(list.agents)
    }

    pub async fn describe_options(&self, agent_id: &str) -> Result<Vec<OptionDef>> {
        let list: OptionList = self
            .get_json(&format!("/api/agents/{}/options", agent_id))
            .await?;
        Ok(list.options)
    }

    /// Submit an execution request.
    ///
    /// Rejections and agent failures both come back as an envelope with
    /// `success: false`; only transport problems and unreadable responses are
    /// errors.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionEnvelope> {
        tracing::debug!(agent = %request.agent, "Submitting execution");
        let response = self
            .http
            .post(self.url("/api/execute"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|_| ClientError::Gateway {
            status: status.as_u16(),
            detail: body_detail(status, &body),
        })
    }

    /// Absolute URL of an artifact download.
    pub fn download_url(&self, artifact: &ArtifactLink) -> String {
        self.url(&artifact.url)
    }

    pub async fn download(&self, artifact: &ArtifactLink) -> Result<Vec<u8>> {
        let response = self.http.get(self.download_url(artifact)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Gateway {
                status: status.as_u16(),
                detail: body_detail(status, &body),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Gateway {
                status: status.as_u16(),
                detail: body_detail(status, &body),
            });
        }
        Ok(response.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn body_detail(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.detail)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                body.trim().to_string()
            }
        })
}
