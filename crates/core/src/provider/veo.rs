//! Veo-style bearer-token provider adapter.
//!
//! Submits to `/v1/video/generate` and polls `/v1/video/status/{id}`. Some
//! deployments answer the submit call with the finished `video_url` directly
//! (cached or short jobs); the adapter surfaces that as an inline result so
//! the tracker can start in the succeeded state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, classify_status, download_to_file, transport_error};
use super::traits::ProviderAdapter;
use super::types::{GenerationRequest, PollStatus, ProviderError, SubmitAck};

/// Configuration for a Veo-style endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeoConfig {
    /// Bearer token.
    pub api_key: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Fixed polling interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Wall-clock deadline for one generation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.veo3.ai".to_string()
}

fn default_poll_interval() -> u64 {
    3
}

fn default_timeout() -> u64 {
    600
}

impl VeoConfig {
    /// Creates a config with defaults for the given token.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
        }
    }

    /// Sets a custom base URL (useful against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    duration_seconds: f64,
    resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    character_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Parses the body of a submit call, handling the inline-completion case.
fn parse_submit_body(body: &str) -> Result<SubmitAck, ProviderError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid generate response: {}", e)))?;

    // Synchronous completion: the result came back with the submit call.
    if let Some(url) = parsed.video_url {
        let job_id = parsed.task_id.unwrap_or_else(|| "inline".to_string());
        return Ok(SubmitAck::completed(job_id, url));
    }

    match parsed.task_id {
        Some(task_id) => Ok(SubmitAck::queued(task_id)),
        None => Err(ProviderError::malformed(
            "generate response has neither task_id nor video_url",
        )),
    }
}

/// Parses the body of a status query.
fn parse_poll_body(body: &str) -> Result<PollStatus, ProviderError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid status response: {}", e)))?;

    let status = parsed.status.as_deref().unwrap_or("");
    match status.to_ascii_lowercase().as_str() {
        "queued" | "pending" => Ok(PollStatus::Queued),
        "processing" | "generating" | "running" => Ok(PollStatus::Processing),
        "completed" | "succeeded" => match parsed.video_url {
            Some(url) => Ok(PollStatus::Completed { media_url: url }),
            None => Err(ProviderError::malformed(
                "completed generation has no video_url",
            )),
        },
        "failed" | "error" => Ok(PollStatus::Failed {
            reason: parsed
                .error
                .unwrap_or_else(|| "generation failed".to_string()),
        }),
        other => Err(ProviderError::malformed(format!(
            "unknown generation status: {}",
            other
        ))),
    }
}

/// Adapter for a Veo-style video generation API.
pub struct VeoProvider {
    config: VeoConfig,
    client: reqwest::Client,
}

impl VeoProvider {
    /// Creates a new adapter.
    pub fn new(config: VeoConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::rejected("Veo api_key is empty"));
        }
        let client = build_client()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for VeoProvider {
    fn name(&self) -> &str {
        "veo"
    }

    async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError> {
        let body = GenerateRequest {
            prompt: &req.prompt,
            duration_seconds: req.duration_secs,
            resolution: req.aspect_ratio.resolution_str(),
            character_id: req.character_reference.as_deref(),
        };

        debug!(scene = req.scene_index, "submitting Veo generation");

        let response = self
            .client
            .post(self.endpoint("/v1/video/generate"))
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        if !(200..300).contains(&status) {
            return Err(classify_status(status, &text));
        }

        parse_submit_body(&text)
    }

    async fn poll(&self, job_id: &str) -> Result<PollStatus, ProviderError> {
        let url = self.endpoint(&format!(
            "/v1/video/status/{}",
            urlencoding::encode(job_id)
        ));
        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ProviderError::JobNotFound {
                job_id: job_id.to_string(),
            });
        }
        let text = response.text().await.map_err(transport_error)?;
        if !(200..300).contains(&status) {
            return Err(classify_status(status, &text));
        }

        parse_poll_body(&text)
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ProviderError> {
        let url = self.endpoint(&format!(
            "/v1/video/cancel/{}",
            urlencoding::encode(job_id)
        ));
        let response = self
            .client
            .post(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        Ok(())
    }

    async fn download(&self, source: &str, dest: &Path) -> Result<(), ProviderError> {
        download_to_file(
            self.client.get(source).header("Authorization", self.bearer()),
            dest,
        )
        .await
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}
