//! Axum route handlers for the generation endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::documents::handlers::stored_selection;
use crate::documents::store;
use crate::errors::AppError;
use crate::generation::fallback::assemble_fallback;
use crate::generation::orchestrator::{drive, resync_via_poll, GenerationProgress};
use crate::generation::wordcount::word_count;
use crate::models::document::{DocumentKind, DocumentRow, DocumentVersionRow, WorkflowStatus};
use crate::modules::payload::flatten_inputs;
use crate::modules::selection::{completeness_report, missing_summary, ModuleSelection};
use crate::state::AppState;
use crate::workflow::events::WorkflowEvent;

#[derive(Serialize)]
pub struct GenerateResponse {
    pub document: DocumentRow,
    pub versions: Vec<DocumentVersionRow>,
    /// True when the content came from the local fallback assembly instead
    /// of the workflow.
    pub fallback: bool,
}

pub(crate) fn ensure_can_generate(
    kind: DocumentKind,
    selection: &ModuleSelection,
    form_data: &Value,
) -> Result<(), AppError> {
    let report = completeness_report(kind, selection, form_data);
    if report.can_generate {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "form data incomplete, missing: {}",
        missing_summary(&report)
    )))
}

/// Persists generated text onto the document and writes the original
/// version row if this was the first successful generation. One call per
/// invocation; returns the reloaded version list.
pub(crate) async fn persist_generation(
    db: &PgPool,
    document: &DocumentRow,
    text: &str,
    run_id: Option<&str>,
) -> Result<Vec<DocumentVersionRow>, AppError> {
    let wc = word_count(text, &document.language);
    store::update_content(db, document.id, text, wc, run_id).await?;
    let has_original = store::has_original_version(db, document.id).await?;
    if let Some(version_type) =
        store::version_type_for(store::PersistOutcome::Generation, has_original)
    {
        store::append_version(db, document.id, version_type, text, wc, None).await?;
    }
    store::list_versions(db, document.id).await
}

/// POST /api/documents/:uuid/generate
///
/// Blocking generation: one workflow round trip, full text in the response.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<GenerateResponse>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let (kind, selection) = stored_selection(&document)?;
    ensure_can_generate(kind, &selection, &document.form_data)?;

    let _lease = state
        .inflight
        .try_acquire(uuid)
        .ok_or(AppError::GenerationInFlight(uuid))?;

    let inputs = flatten_inputs(kind, uuid, &document.language, &selection, &document.form_data);
    let user = uuid.to_string();

    let outcome = match state.workflow.run_blocking(&inputs, &user).await {
        Ok(run) => {
            let run_failed = matches!(
                run.data.status.as_deref().and_then(WorkflowStatus::parse),
                Some(WorkflowStatus::Failed) | Some(WorkflowStatus::Stopped)
            );
            if run_failed {
                Err(run
                    .data
                    .error
                    .clone()
                    .unwrap_or_else(|| "workflow did not succeed".to_string()))
            } else {
                match run.output_text() {
                    Some(text) => Ok((text, run.workflow_run_id)),
                    None => Err("workflow finished without output".to_string()),
                }
            }
        }
        Err(e) => Err(e.to_string()),
    };

    match outcome {
        Ok((text, run_id)) => {
            let versions = persist_generation(&state.db, &document, &text, Some(&run_id)).await?;
            let document = store::get_document(&state.db, uuid).await?;
            Ok(Json(GenerateResponse {
                document,
                versions,
                fallback: false,
            }))
        }
        Err(message) => {
            warn!("Generation failed for document {uuid}: {message}");
            let Some(text) = assemble_fallback(kind, &document.form_data, &selection) else {
                return Err(AppError::Workflow(message));
            };
            let versions = persist_generation(&state.db, &document, &text, None).await?;
            let document = store::get_document(&state.db, uuid).await?;
            Ok(Json(GenerateResponse {
                document,
                versions,
                fallback: true,
            }))
        }
    }
}

/// POST /api/documents/:uuid/generate/stream
///
/// SSE relay of the workflow stream. A spawned task owns the run: it drives
/// the event channel, persists the result exactly once, and keeps going
/// even if the subscriber disconnects mid-stream.
pub async fn handle_generate_stream(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let (kind, selection) = stored_selection(&document)?;
    ensure_can_generate(kind, &selection, &document.form_data)?;

    let lease = state
        .inflight
        .try_acquire(uuid)
        .ok_or(AppError::GenerationInFlight(uuid))?;

    let inputs = flatten_inputs(kind, uuid, &document.language, &selection, &document.form_data);
    let user = uuid.to_string();

    let (relay_tx, relay_rx) = mpsc::unbounded_channel();

    match state.workflow.run_streaming(&inputs, &user).await {
        Ok(rx) => {
            let db = state.db.clone();
            let runner = Arc::clone(&state.workflow);
            tokio::spawn(async move {
                let _lease = lease;
                let mut progress = drive(rx, Some(relay_tx.clone())).await;
                let stream_terminal = progress.is_terminal();
                if !stream_terminal {
                    resync_via_poll(runner.as_ref(), &mut progress).await;
                }
                finalize_stream(
                    &db,
                    &document,
                    kind,
                    &selection,
                    progress,
                    stream_terminal,
                    &relay_tx,
                )
                .await;
            });
        }
        Err(e) => {
            // Submission itself failed; there is no run to drive. The lease
            // drops at the end of this scope.
            let message = e.to_string();
            warn!("Workflow submission failed for document {uuid}: {message}");
            let _ = relay_tx.send(error_event(message));
            if let Some(text) = assemble_fallback(kind, &document.form_data, &selection) {
                persist_generation(&state.db, &document, &text, None).await?;
                let _ = relay_tx.send(fallback_finished(&text));
            }
        }
    }

    Ok(sse_response(relay_rx))
}

pub(crate) fn error_event(message: String) -> WorkflowEvent {
    WorkflowEvent::Error { message }
}

/// Synthesized terminal event for runs whose stream never delivered one.
pub(crate) fn finished_event(text: &str) -> WorkflowEvent {
    WorkflowEvent::WorkflowFinished {
        outputs: Some(json!({ "text": text })),
        status: Some("succeeded".to_string()),
        error: None,
    }
}

/// Finished event carrying fallback content; the marker lets clients tell
/// the two apart.
fn fallback_finished(text: &str) -> WorkflowEvent {
    WorkflowEvent::WorkflowFinished {
        outputs: Some(json!({ "text": text, "fallback": true })),
        status: Some("succeeded".to_string()),
        error: None,
    }
}

/// Persists the outcome of a streamed run and fills in any terminal events
/// the upstream never delivered.
async fn finalize_stream(
    db: &PgPool,
    document: &DocumentRow,
    kind: DocumentKind,
    selection: &ModuleSelection,
    progress: GenerationProgress,
    stream_terminal: bool,
    relay: &mpsc::UnboundedSender<WorkflowEvent>,
) {
    match progress.final_text() {
        Some(text) => {
            match persist_generation(db, document, text, progress.run_id.as_deref()).await {
                Ok(_) => {
                    if !stream_terminal {
                        let _ = relay.send(finished_event(text));
                    }
                }
                Err(e) => {
                    error!("Failed to persist generation for {}: {e}", document.id);
                    let _ = relay.send(error_event(
                        "failed to save generated document".to_string(),
                    ));
                }
            }
        }
        None => {
            if !stream_terminal {
                let _ = relay.send(error_event(
                    progress
                        .error
                        .clone()
                        .unwrap_or_else(|| "generation failed".to_string()),
                ));
            }
            if let Some(text) = assemble_fallback(kind, &document.form_data, selection) {
                match persist_generation(db, document, &text, None).await {
                    Ok(_) => {
                        let _ = relay.send(fallback_finished(&text));
                    }
                    Err(e) => {
                        error!("Failed to persist fallback for {}: {e}", document.id);
                    }
                }
            }
        }
    }
}

fn event_name(event: &WorkflowEvent) -> &'static str {
    match event {
        WorkflowEvent::WorkflowStarted { .. } => "workflow_started",
        WorkflowEvent::NodeStarted { .. } => "node_started",
        WorkflowEvent::TextChunk { .. } => "text_chunk",
        WorkflowEvent::NodeFinished { .. } => "node_finished",
        WorkflowEvent::WorkflowFinished { .. } => "workflow_finished",
        WorkflowEvent::Error { .. } => "error",
    }
}

/// Adapts the relay channel into an SSE response. The stream ends when the
/// driving task drops its last sender.
pub(crate) fn sse_response(
    relay_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = stream::unfold(relay_rx, |mut rx| async move {
        let event = rx.recv().await?;
        let frame = Event::default()
            .event(event_name(&event))
            .json_data(&event);
        Some((frame, rx))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
