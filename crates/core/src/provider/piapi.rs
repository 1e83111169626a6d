//! PiAPI task-queue provider adapter.
//!
//! PiAPI fronts several hosted video models (Hailuo, Seedance, Kling) behind
//! one task API: submit a task, poll it by id, fetch the output URL when it
//! completes. One adapter instance drives one model; configure several
//! instances to treat the models as distinct providers in the preference
//! list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, classify_status, download_to_file, transport_error};
use super::traits::ProviderAdapter;
use super::types::{GenerationRequest, PollStatus, ProviderError, SubmitAck};

/// Configuration for one PiAPI-hosted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiapiConfig {
    /// API key sent in the `x-api-key` header.
    pub api_key: String,

    /// Model identifier, e.g. "hailuo-02" or "seedance-1.0".
    pub model: String,

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
    "https://api.piapi.ai".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    300
}

impl PiapiConfig {
    /// Creates a config with defaults for the given key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
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
struct TaskRequest<'a> {
    model: &'a str,
    task_type: &'a str,
    input: TaskInput<'a>,
}

#[derive(Serialize)]
struct TaskInput<'a> {
    prompt: &'a str,
    duration: f64,
    resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    character_reference: Option<&'a str>,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    #[serde(default)]
    data: Option<TaskData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct TaskData {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<TaskOutput>,
    #[serde(default)]
    error: Option<TaskError>,
}

#[derive(Deserialize)]
struct TaskOutput {
    #[serde(default)]
    video_url: Option<String>,
}

#[derive(Deserialize)]
struct TaskError {
    #[serde(default)]
    message: Option<String>,
}

/// Parses the body of a successful task submission.
fn parse_submit_body(body: &str) -> Result<SubmitAck, ProviderError> {
    let envelope: TaskEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid submit response: {}", e)))?;

    let task_id = envelope
        .data
        .and_then(|d| d.task_id)
        .ok_or_else(|| ProviderError::malformed("submit response has no task_id"))?;

    Ok(SubmitAck::queued(task_id))
}

/// Parses the body of a task status query.
fn parse_poll_body(body: &str) -> Result<PollStatus, ProviderError> {
    let envelope: TaskEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid status response: {}", e)))?;

    let data = envelope
        .data
        .ok_or_else(|| ProviderError::malformed("status response has no data"))?;

    let status = data.status.as_deref().unwrap_or("");
    match status.to_ascii_lowercase().as_str() {
        "pending" | "queued" | "staged" => Ok(PollStatus::Queued),
        "processing" | "running" | "in_progress" => Ok(PollStatus::Processing),
        "completed" | "success" | "finished" => {
            let url = data
                .output
                .and_then(|o| o.video_url)
                .ok_or_else(|| ProviderError::malformed("completed task has no video_url"))?;
            Ok(PollStatus::Completed { media_url: url })
        }
        "failed" | "error" | "cancelled" => {
            let reason = data
                .error
                .and_then(|e| e.message)
                .or(envelope.message)
                .unwrap_or_else(|| "task failed".to_string());
            Ok(PollStatus::Failed { reason })
        }
        other => Err(ProviderError::malformed(format!(
            "unknown task status: {}",
            other
        ))),
    }
}

/// PiAPI task-queue adapter for one hosted model.
pub struct PiapiProvider {
    name: String,
    config: PiapiConfig,
    client: reqwest::Client,
}

impl PiapiProvider {
    /// Creates a new adapter for the configured model.
    pub fn new(config: PiapiConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::rejected("PiAPI api_key is empty"));
        }
        let client = build_client()?;
        Ok(Self {
            name: format!("piapi/{}", config.model),
            config,
            client,
        })
    }

    fn task_url(&self) -> String {
        format!("{}/api/v1/task", self.config.base_url.trim_end_matches('/'))
    }

    fn task_status_url(&self, job_id: &str) -> String {
        format!(
            "{}/api/v1/task/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(job_id)
        )
    }
}

#[async_trait]
impl ProviderAdapter for PiapiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError> {
        let body = TaskRequest {
            model: &self.config.model,
            task_type: "video_generation",
            input: TaskInput {
                prompt: &req.prompt,
                duration: req.duration_secs,
                resolution: req.aspect_ratio.resolution_str(),
                character_reference: req.character_reference.as_deref(),
            },
        };

        debug!(provider = %self.name, scene = req.scene_index, "submitting generation task");

        let response = self
            .client
            .post(self.task_url())
            .header("x-api-key", &self.config.api_key)
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
        let response = self
            .client
            .get(self.task_status_url(job_id))
            .header("x-api-key", &self.config.api_key)
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
        let url = format!("{}/cancel", self.task_status_url(job_id));
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
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
        // Output URLs point at a public CDN; no auth header needed.
        download_to_file(self.client.get(source), dest).await
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}
