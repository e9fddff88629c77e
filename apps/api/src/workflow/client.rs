//! Workflow client — the single point of entry for all AI workflow calls.
//!
//! ARCHITECTURAL RULE: No other module may call the workflow service
//! directly. Generation and revision runs MUST go through `WorkflowRunner`.
//!
//! The trait exists so tests can drive the orchestrator with a scripted
//! runner; `AppState` carries an `Arc<dyn WorkflowRunner>`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::workflow::events::{outputs_text, SseBuffer, WorkflowEvent};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_RETRIES: u32 = 3;
/// Buffered events between the reader task and the orchestrator.
const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Workflow returned no output text")]
    EmptyOutput,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    inputs: &'a BTreeMap<String, String>,
    response_mode: &'static str,
    user: &'a str,
}

/// Response of a blocking run.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockingRunResponse {
    pub workflow_run_id: String,
    // Part of the wire shape; nothing downstream addresses tasks.
    #[allow(dead_code)]
    pub task_id: String,
    pub data: RunResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunResult {
    pub outputs: Option<Value>,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl BlockingRunResponse {
    /// Extracts the generated text from the run outputs.
    pub fn output_text(&self) -> Option<String> {
        self.data.outputs.as_ref().and_then(outputs_text)
    }
}

/// Response of the run status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct RunStatusResponse {
    // Run id echoed back by the service; the poller already holds it.
    #[allow(dead_code)]
    pub id: String,
    pub status: String,
    pub outputs: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkflowApiError {
    message: String,
}

/// The workflow runner seam. Production uses `HttpWorkflowRunner`; tests
/// swap in a scripted implementation without touching handler code.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn run_blocking(
        &self,
        inputs: &BTreeMap<String, String>,
        user: &str,
    ) -> Result<BlockingRunResponse, WorkflowError>;

    /// Starts a streaming run. Events arrive on the returned channel; the
    /// channel closing without a terminal event means the stream dropped
    /// mid-run and the caller should fall back to status polling.
    async fn run_streaming(
        &self,
        inputs: &BTreeMap<String, String>,
        user: &str,
    ) -> Result<mpsc::Receiver<WorkflowEvent>, WorkflowError>;

    async fn run_status(&self, run_id: &str) -> Result<RunStatusResponse, WorkflowError>;
}

/// HTTP client for the external workflow service.
/// Retries blocking calls on 429 and 5xx with exponential backoff.
#[derive(Clone)]
pub struct HttpWorkflowRunner {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpWorkflowRunner {
    pub fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn run_url(&self) -> String {
        format!("{}/workflows/run", self.base_url)
    }

    fn status_url(&self, run_id: &str) -> String {
        format!("{}/workflows/run/{}", self.base_url, run_id)
    }
}

#[async_trait]
impl WorkflowRunner for HttpWorkflowRunner {
    async fn run_blocking(
        &self,
        inputs: &BTreeMap<String, String>,
        user: &str,
    ) -> Result<BlockingRunResponse, WorkflowError> {
        let request_body = RunRequest {
            inputs,
            response_mode: "blocking",
            user,
        };

        let mut last_error: Option<WorkflowError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Workflow call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(self.run_url())
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(WorkflowError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Workflow API returned {}: {}", status, body);
                last_error = Some(WorkflowError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<WorkflowApiError>(&body)
                    .map(|e| e.message)
                    .unwrap_or(body);
                return Err(WorkflowError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let run: BlockingRunResponse = response.json().await?;
            debug!(
                "Blocking workflow run {} finished with status {:?}",
                run.workflow_run_id, run.data.status
            );
            return Ok(run);
        }

        Err(last_error.unwrap_or(WorkflowError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    async fn run_streaming(
        &self,
        inputs: &BTreeMap<String, String>,
        user: &str,
    ) -> Result<mpsc::Receiver<WorkflowEvent>, WorkflowError> {
        let request_body = RunRequest {
            inputs,
            response_mode: "streaming",
            user,
        };

        let response = self
            .client
            .post(self.run_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WorkflowApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(WorkflowError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buf = SseBuffer::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(WorkflowEvent::Error {
                                message: format!("stream read failed: {e}"),
                            })
                            .await;
                        return;
                    }
                };

                for event in buf.push(&bytes) {
                    let terminal = event.is_terminal();
                    if tx.send(event).await.is_err() {
                        // Receiver gone; stop reading.
                        return;
                    }
                    if terminal {
                        return;
                    }
                }
            }
            // Stream ended without a terminal event. Dropping the sender
            // closes the channel and the orchestrator falls back to polling.
            debug!("Workflow stream ended without terminal event");
        });

        Ok(rx)
    }

    async fn run_status(&self, run_id: &str) -> Result<RunStatusResponse, WorkflowError> {
        let response = self
            .client
            .get(self.status_url(run_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}
