//! Generation state machine.
//!
//! One `GenerationProgress` tracks a single workflow invocation:
//!
//! ```text
//! idle -> awaiting_first_chunk -> streaming -> finished
//!                 |                   |
//!                 +-------------------+-----> failed
//! ```
//!
//! The `awaiting_first_chunk -> streaming` transition fires on the FIRST
//! text chunk so callers can drop their loading indicator immediately. A
//! run that emits no chunks still finishes: the terminal event carries the
//! full text and the same persistence step runs on the buffer.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::document::WorkflowStatus;
use crate::workflow::client::WorkflowRunner;
use crate::workflow::events::{outputs_text, WorkflowEvent};

/// Poll cadence when a stream drops before its terminal event.
pub const STATUS_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);
/// Upper bound on status polls (5 minutes at the 2s cadence).
const MAX_STATUS_POLLS: u32 = 150;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Idle,
    AwaitingFirstChunk,
    Streaming,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub struct GenerationProgress {
    pub phase: GenerationPhase,
    /// Accumulated text chunks, or the terminal output when no chunks came.
    pub buffer: String,
    pub run_id: Option<String>,
    pub task_id: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub error: Option<String>,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationProgress {
    pub fn new() -> Self {
        Self {
            phase: GenerationPhase::Idle,
            buffer: String::new(),
            run_id: None,
            task_id: None,
            status: None,
            error: None,
        }
    }

    /// Marks the run submitted. The caller shows its loading state from
    /// here until the first chunk.
    pub fn begin(&mut self) {
        self.phase = GenerationPhase::AwaitingFirstChunk;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            GenerationPhase::Finished | GenerationPhase::Failed
        )
    }

    /// The persisted text of a finished run. `None` unless finished.
    pub fn final_text(&self) -> Option<&str> {
        (self.phase == GenerationPhase::Finished).then_some(self.buffer.as_str())
    }

    /// Folds one workflow event into the state machine. Events after a
    /// terminal state are ignored.
    pub fn apply(&mut self, event: &WorkflowEvent) {
        if self.is_terminal() {
            return;
        }

        match event {
            WorkflowEvent::WorkflowStarted { id, task_id } => {
                self.run_id = Some(id.clone());
                self.task_id = task_id.clone();
                self.status = Some(WorkflowStatus::Running);
            }
            WorkflowEvent::NodeStarted { .. } | WorkflowEvent::NodeFinished { .. } => {}
            WorkflowEvent::TextChunk { text } => {
                if self.phase == GenerationPhase::AwaitingFirstChunk {
                    self.phase = GenerationPhase::Streaming;
                }
                self.buffer.push_str(text);
            }
            WorkflowEvent::WorkflowFinished {
                outputs,
                status,
                error,
            } => {
                let parsed = status.as_deref().and_then(WorkflowStatus::parse);
                self.status = Some(parsed.unwrap_or(WorkflowStatus::Succeeded));
                match self.status {
                    Some(WorkflowStatus::Failed) | Some(WorkflowStatus::Stopped) => {
                        self.fail(
                            error
                                .clone()
                                .unwrap_or_else(|| "workflow did not succeed".to_string()),
                        );
                    }
                    _ => {
                        if self.buffer.is_empty() {
                            if let Some(text) = outputs.as_ref().and_then(outputs_text) {
                                self.buffer = text;
                            }
                        }
                        if self.buffer.is_empty() {
                            self.fail("workflow finished without output".to_string());
                        } else {
                            self.phase = GenerationPhase::Finished;
                        }
                    }
                }
            }
            WorkflowEvent::Error { message } => {
                self.status = Some(WorkflowStatus::Failed);
                self.fail(message.clone());
            }
        }
    }

    fn fail(&mut self, message: String) {
        warn!("Generation failed: {message}");
        self.phase = GenerationPhase::Failed;
        self.error = Some(message);
    }
}

/// Consumes a streaming run to completion, folding every event into a
/// fresh `GenerationProgress`. Each event is forwarded on `relay` (when
/// given) before the next is read, so SSE subscribers see the stream
/// live. Returns when a terminal event arrives or the channel closes;
/// a non-terminal result means the stream dropped mid-run.
pub async fn drive(
    mut rx: mpsc::Receiver<WorkflowEvent>,
    relay: Option<mpsc::UnboundedSender<WorkflowEvent>>,
) -> GenerationProgress {
    let mut progress = GenerationProgress::new();
    progress.begin();

    while let Some(event) = rx.recv().await {
        progress.apply(&event);
        if let Some(tx) = &relay {
            // Subscriber may have disconnected; persistence continues.
            let _ = tx.send(event);
        }
        if progress.is_terminal() {
            break;
        }
    }

    progress
}

/// Re-synchronizes a run whose stream ended without a terminal event by
/// polling the run status at a fixed cadence until it leaves `running`.
/// The progress always ends terminal: succeeded polls finish it with the
/// buffered or polled output, everything else fails it.
pub async fn resync_via_poll(runner: &dyn WorkflowRunner, progress: &mut GenerationProgress) {
    if progress.is_terminal() {
        return;
    }

    let Some(run_id) = progress.run_id.clone() else {
        progress.fail("stream ended before the run was acknowledged".to_string());
        return;
    };

    info!("Stream for run {run_id} ended early, falling back to status polling");

    for _ in 0..MAX_STATUS_POLLS {
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;

        let poll = match runner.run_status(&run_id).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Status poll for run {run_id} failed: {e}");
                continue;
            }
        };

        match WorkflowStatus::parse(&poll.status) {
            Some(WorkflowStatus::Running) | None => continue,
            Some(WorkflowStatus::Succeeded) => {
                progress.status = Some(WorkflowStatus::Succeeded);
                if progress.buffer.is_empty() {
                    if let Some(text) = poll.outputs.as_ref().and_then(outputs_text) {
                        progress.buffer = text;
                    }
                }
                if progress.buffer.is_empty() {
                    progress.fail("run succeeded but returned no output".to_string());
                } else {
                    progress.phase = GenerationPhase::Finished;
                }
                return;
            }
            Some(status) => {
                progress.status = Some(status);
                progress.fail(
                    poll.error
                        .unwrap_or_else(|| format!("run ended with status {}", poll.status)),
                );
                return;
            }
        }
    }

    progress.fail("status polling timed out".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::client::{BlockingRunResponse, RunStatusResponse, WorkflowError};
    use serde_json::json;

    fn chunk(text: &str) -> WorkflowEvent {
        WorkflowEvent::TextChunk {
            text: text.to_string(),
        }
    }

    fn finished(outputs: Option<serde_json::Value>, status: &str) -> WorkflowEvent {
        WorkflowEvent::WorkflowFinished {
            outputs,
            status: Some(status.to_string()),
            error: None,
        }
    }

    #[test]
    fn test_begin_enters_awaiting_first_chunk() {
        let mut progress = GenerationProgress::new();
        assert_eq!(progress.phase, GenerationPhase::Idle);
        progress.begin();
        assert_eq!(progress.phase, GenerationPhase::AwaitingFirstChunk);
    }

    #[test]
    fn test_first_chunk_ends_loading_and_chunks_accumulate() {
        let mut progress = GenerationProgress::new();
        progress.begin();

        progress.apply(&chunk("Hello, "));
        // Loading ends on the FIRST chunk, not the second.
        assert_eq!(progress.phase, GenerationPhase::Streaming);
        assert_eq!(progress.buffer, "Hello, ");

        progress.apply(&chunk("world."));
        assert_eq!(progress.phase, GenerationPhase::Streaming);
        assert_eq!(progress.buffer, "Hello, world.");

        progress.apply(&finished(None, "succeeded"));
        assert_eq!(progress.phase, GenerationPhase::Finished);
        assert_eq!(progress.final_text(), Some("Hello, world."));
    }

    #[test]
    fn test_run_identity_captured_from_started_event() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&WorkflowEvent::WorkflowStarted {
            id: "run-1".to_string(),
            task_id: Some("task-2".to_string()),
        });

        assert_eq!(progress.run_id.as_deref(), Some("run-1"));
        assert_eq!(progress.task_id.as_deref(), Some("task-2"));
        assert_eq!(progress.status, Some(WorkflowStatus::Running));
        assert_eq!(progress.phase, GenerationPhase::AwaitingFirstChunk);
    }

    #[test]
    fn test_terminal_without_chunks_uses_outputs_text() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&finished(
            Some(json!({ "text": "Full document body" })),
            "succeeded",
        ));

        assert_eq!(progress.phase, GenerationPhase::Finished);
        assert_eq!(progress.final_text(), Some("Full document body"));
    }

    #[test]
    fn test_buffered_chunks_win_over_outputs() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&chunk("streamed"));
        progress.apply(&finished(Some(json!({ "text": "replaced" })), "succeeded"));

        assert_eq!(progress.final_text(), Some("streamed"));
    }

    #[test]
    fn test_error_event_fails_the_run() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&WorkflowEvent::Error {
            message: "quota exceeded".to_string(),
        });

        assert_eq!(progress.phase, GenerationPhase::Failed);
        assert_eq!(progress.error.as_deref(), Some("quota exceeded"));
        assert_eq!(progress.final_text(), None);
    }

    #[test]
    fn test_finished_with_failed_status_fails() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&chunk("partial"));
        progress.apply(&WorkflowEvent::WorkflowFinished {
            outputs: None,
            status: Some("failed".to_string()),
            error: Some("node crashed".to_string()),
        });

        assert_eq!(progress.phase, GenerationPhase::Failed);
        assert_eq!(progress.error.as_deref(), Some("node crashed"));
        assert_eq!(progress.final_text(), None);
    }

    #[test]
    fn test_succeeded_without_any_output_fails() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&finished(Some(json!({})), "succeeded"));

        assert_eq!(progress.phase, GenerationPhase::Failed);
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&chunk("done"));
        progress.apply(&finished(None, "succeeded"));
        progress.apply(&chunk("late chunk"));

        assert_eq!(progress.final_text(), Some("done"));
    }

    #[tokio::test]
    async fn test_drive_folds_channel_and_relays() {
        let (tx, rx) = mpsc::channel(8);
        let (relay_tx, mut relay_rx) = mpsc::unbounded_channel();

        tx.send(chunk("Hello, ")).await.unwrap();
        tx.send(chunk("world.")).await.unwrap();
        tx.send(finished(None, "succeeded")).await.unwrap();
        drop(tx);

        let progress = drive(rx, Some(relay_tx)).await;
        assert_eq!(progress.final_text(), Some("Hello, world."));

        let mut relayed = Vec::new();
        while let Ok(event) = relay_rx.try_recv() {
            relayed.push(event);
        }
        assert_eq!(relayed.len(), 3);
        assert!(relayed.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_drive_returns_non_terminal_when_stream_drops() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(WorkflowEvent::WorkflowStarted {
            id: "run-5".to_string(),
            task_id: None,
        })
        .await
        .unwrap();
        tx.send(chunk("partial ")).await.unwrap();
        drop(tx);

        let progress = drive(rx, None).await;
        assert!(!progress.is_terminal());
        assert_eq!(progress.phase, GenerationPhase::Streaming);
        assert_eq!(progress.buffer, "partial ");
        assert_eq!(progress.run_id.as_deref(), Some("run-5"));
    }

    #[tokio::test]
    async fn test_resync_without_run_id_fails_immediately() {
        let mut progress = GenerationProgress::new();
        progress.begin();

        // No run id was ever acknowledged; polling has nothing to poll.
        let runner = ScriptedStatusRunner::new(vec![]);
        resync_via_poll(&runner, &mut progress).await;

        assert_eq!(progress.phase, GenerationPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_polls_until_status_leaves_running() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&WorkflowEvent::WorkflowStarted {
            id: "run-9".to_string(),
            task_id: None,
        });

        let runner = ScriptedStatusRunner::new(vec![
            ("running", None),
            ("running", None),
            ("succeeded", Some(json!({ "text": "polled output" }))),
        ]);
        resync_via_poll(&runner, &mut progress).await;

        assert_eq!(progress.phase, GenerationPhase::Finished);
        assert_eq!(progress.final_text(), Some("polled output"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_failure_status_fails_run() {
        let mut progress = GenerationProgress::new();
        progress.begin();
        progress.apply(&WorkflowEvent::WorkflowStarted {
            id: "run-10".to_string(),
            task_id: None,
        });
        progress.apply(&chunk("partial"));

        let runner = ScriptedStatusRunner::new(vec![("running", None), ("failed", None)]);
        resync_via_poll(&runner, &mut progress).await;

        assert_eq!(progress.phase, GenerationPhase::Failed);
        assert_eq!(progress.status, Some(WorkflowStatus::Failed));
    }

    /// Scripted runner: serves one status response per poll, repeating the
    /// last one once the script runs out.
    struct ScriptedStatusRunner {
        statuses: Vec<(&'static str, Option<serde_json::Value>)>,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl ScriptedStatusRunner {
        fn new(statuses: Vec<(&'static str, Option<serde_json::Value>)>) -> Self {
            Self {
                statuses,
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl WorkflowRunner for ScriptedStatusRunner {
        async fn run_blocking(
            &self,
            _inputs: &std::collections::BTreeMap<String, String>,
            _user: &str,
        ) -> Result<BlockingRunResponse, WorkflowError> {
            Err(WorkflowError::EmptyOutput)
        }

        async fn run_streaming(
            &self,
            _inputs: &std::collections::BTreeMap<String, String>,
            _user: &str,
        ) -> Result<mpsc::Receiver<WorkflowEvent>, WorkflowError> {
            Err(WorkflowError::EmptyOutput)
        }

        async fn run_status(
            &self,
            run_id: &str,
        ) -> Result<RunStatusResponse, WorkflowError> {
            use std::sync::atomic::Ordering;
            let i = self
                .calls
                .fetch_add(1, Ordering::SeqCst)
                .min(self.statuses.len().saturating_sub(1));
            let (status, outputs) = self
                .statuses
                .get(i)
                .cloned()
                .unwrap_or(("failed", None));
            Ok(RunStatusResponse {
                id: run_id.to_string(),
                status: status.to_string(),
                outputs,
                error: None,
            })
        }
    }
}
