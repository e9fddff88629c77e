//! Axum route handlers for the revision endpoints. One POST route carries
//! all three revision shapes, dispatched on the `scope` tag: whole-document
//! (streaming), paragraph candidate (blocking, no persistence), and
//! paragraph accept (local mutation).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response, Sse},
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::documents::store;
use crate::errors::AppError;
use crate::generation::handlers::{error_event, finished_event, sse_response};
use crate::generation::orchestrator::{drive, resync_via_poll, GenerationProgress};
use crate::generation::wordcount::word_count;
use crate::models::document::{DocumentKind, DocumentRow, DocumentVersionRow, WorkflowStatus};
use crate::revision::entitlement::{consume_free_revision, ensure_revision_available};
use crate::revision::paragraphs::{replace_paragraph, split_paragraphs};
use crate::revision::settings::{RevisionScope, RevisionSettings};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RevisionRequest {
    WholeDocument {
        settings: RevisionSettings,
    },
    Paragraph {
        settings: RevisionSettings,
        paragraph_index: usize,
    },
    ParagraphAccept {
        paragraph_index: usize,
        text: String,
    },
}

#[derive(Serialize)]
pub struct RevisionStatusResponse {
    pub has_used_free_revision: bool,
    pub versions: Vec<DocumentVersionRow>,
}

/// GET /api/documents/:uuid/revisions
pub async fn handle_revision_status(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<RevisionStatusResponse>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let versions = store::list_versions(&state.db, uuid).await?;
    Ok(Json(RevisionStatusResponse {
        has_used_free_revision: document.has_used_free_revision,
        versions,
    }))
}

/// POST /api/documents/:uuid/revisions
pub async fn handle_revise(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<RevisionRequest>,
) -> Result<Response, AppError> {
    match req {
        RevisionRequest::WholeDocument { settings } => revise_whole_document(state, uuid, settings)
            .await
            .map(IntoResponse::into_response),
        RevisionRequest::Paragraph {
            settings,
            paragraph_index,
        } => revise_paragraph(state, uuid, settings, paragraph_index)
            .await
            .map(IntoResponse::into_response),
        RevisionRequest::ParagraphAccept {
            paragraph_index,
            text,
        } => accept_paragraph(state, uuid, paragraph_index, text)
            .await
            .map(IntoResponse::into_response),
    }
}

fn document_kind(document: &DocumentRow) -> Result<DocumentKind, AppError> {
    document
        .kind()
        .ok_or_else(|| anyhow::anyhow!("document {} has unknown type", document.id).into())
}

fn revision_inputs(
    document: &DocumentRow,
    kind: DocumentKind,
    scope: RevisionScope,
    settings: &RevisionSettings,
    content: &str,
) -> BTreeMap<String, String> {
    let mut inputs = BTreeMap::new();
    inputs.insert("content".to_string(), content.to_string());
    inputs.insert("language".to_string(), document.language.clone());
    inputs.insert("document_id".to_string(), document.id.to_string());
    inputs.insert("document_type".to_string(), kind.as_str().to_string());
    settings.apply_to_inputs(scope, &mut inputs);
    inputs
}

/// Writes revised content, appends the revised version row and consumes
/// the entitlement. One call per accepted revision.
async fn persist_revision(
    db: &PgPool,
    cache: &Cache,
    document: &DocumentRow,
    text: &str,
    run_id: Option<&str>,
    settings_value: Option<Value>,
) -> Result<Vec<DocumentVersionRow>, AppError> {
    let wc = word_count(text, &document.language);
    store::update_content(db, document.id, text, wc, run_id).await?;
    let has_original = store::has_original_version(db, document.id).await?;
    if let Some(version_type) =
        store::version_type_for(store::PersistOutcome::Revision, has_original)
    {
        store::append_version(db, document.id, version_type, text, wc, settings_value.as_ref())
            .await?;
    }
    consume_free_revision(db, cache, document.id).await?;
    store::list_versions(db, document.id).await
}

/// Whole-document revision: the streaming contract of generation plus the
/// entitlement gate. The revised version row and the flag flip happen only
/// on a finished run; failures leave the entitlement untouched.
async fn revise_whole_document(
    state: AppState,
    uuid: Uuid,
    settings: RevisionSettings,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, axum::Error>>>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let kind = document_kind(&document)?;
    let content = document
        .content
        .clone()
        .ok_or_else(|| AppError::Validation("document has no content to revise".to_string()))?;

    settings
        .validate(RevisionScope::WholeDocument)
        .map_err(AppError::Validation)?;
    ensure_revision_available(&state.db, &state.cache, uuid).await?;

    let lease = state
        .inflight
        .try_acquire(uuid)
        .ok_or(AppError::GenerationInFlight(uuid))?;

    let inputs = revision_inputs(
        &document,
        kind,
        RevisionScope::WholeDocument,
        &settings,
        &content,
    );
    let user = uuid.to_string();
    let (relay_tx, relay_rx) = mpsc::unbounded_channel();

    match state.workflow.run_streaming(&inputs, &user).await {
        Ok(rx) => {
            let db = state.db.clone();
            let cache = state.cache.clone();
            let runner = Arc::clone(&state.workflow);
            let settings_value = serde_json::to_value(&settings).ok();
            tokio::spawn(async move {
                let _lease = lease;
                let mut progress = drive(rx, Some(relay_tx.clone())).await;
                let stream_terminal = progress.is_terminal();
                if !stream_terminal {
                    resync_via_poll(runner.as_ref(), &mut progress).await;
                }
                finalize_revision(
                    &db,
                    &cache,
                    &document,
                    progress,
                    stream_terminal,
                    settings_value,
                    &relay_tx,
                )
                .await;
            });
        }
        Err(e) => {
            // No fallback for revisions; the caller keeps the current text.
            let message = e.to_string();
            warn!("Revision submission failed for document {uuid}: {message}");
            let _ = relay_tx.send(error_event(message));
        }
    }

    Ok(sse_response(relay_rx))
}

async fn finalize_revision(
    db: &PgPool,
    cache: &Cache,
    document: &DocumentRow,
    progress: GenerationProgress,
    stream_terminal: bool,
    settings_value: Option<Value>,
    relay: &mpsc::UnboundedSender<crate::workflow::events::WorkflowEvent>,
) {
    let Some(text) = progress.final_text() else {
        if !stream_terminal {
            let _ = relay.send(error_event(
                progress
                    .error
                    .clone()
                    .unwrap_or_else(|| "revision failed".to_string()),
            ));
        }
        return;
    };

    match persist_revision(
        db,
        cache,
        document,
        text,
        progress.run_id.as_deref(),
        settings_value,
    )
    .await
    {
        Ok(_) => {
            if !stream_terminal {
                let _ = relay.send(finished_event(text));
            }
        }
        Err(e) => {
            error!("Failed to persist revision for {}: {e}", document.id);
            let _ = relay.send(error_event("failed to save revised document".to_string()));
        }
    }
}

#[derive(Serialize)]
pub struct ParagraphCandidateResponse {
    pub paragraph_index: usize,
    pub original: String,
    pub candidate: String,
}

/// Paragraph revision: one blocking workflow round trip returning a
/// candidate. Nothing is persisted and the entitlement stays intact until
/// the caller accepts.
async fn revise_paragraph(
    state: AppState,
    uuid: Uuid,
    settings: RevisionSettings,
    paragraph_index: usize,
) -> Result<Json<ParagraphCandidateResponse>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let kind = document_kind(&document)?;
    let content = document
        .content
        .as_deref()
        .ok_or_else(|| AppError::Validation("document has no content to revise".to_string()))?;

    settings
        .validate(RevisionScope::Paragraph)
        .map_err(AppError::Validation)?;
    ensure_revision_available(&state.db, &state.cache, uuid).await?;

    let paragraphs = split_paragraphs(content);
    let original = paragraphs
        .get(paragraph_index)
        .cloned()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "paragraph index {paragraph_index} out of range (document has {} paragraphs)",
                paragraphs.len()
            ))
        })?;

    let _lease = state
        .inflight
        .try_acquire(uuid)
        .ok_or(AppError::GenerationInFlight(uuid))?;

    let mut inputs = revision_inputs(
        &document,
        kind,
        RevisionScope::Paragraph,
        &settings,
        content,
    );
    inputs.insert("paragraph_text".to_string(), original.clone());
    inputs.insert("paragraph_index".to_string(), paragraph_index.to_string());

    let run = state
        .workflow
        .run_blocking(&inputs, &uuid.to_string())
        .await
        .map_err(|e| AppError::Workflow(e.to_string()))?;

    let run_failed = matches!(
        run.data.status.as_deref().and_then(WorkflowStatus::parse),
        Some(WorkflowStatus::Failed) | Some(WorkflowStatus::Stopped)
    );
    if run_failed {
        return Err(AppError::Workflow(
            run.data
                .error
                .unwrap_or_else(|| "workflow did not succeed".to_string()),
        ));
    }

    let candidate = run
        .output_text()
        .ok_or_else(|| AppError::Workflow("workflow finished without output".to_string()))?;

    Ok(Json(ParagraphCandidateResponse {
        paragraph_index,
        original,
        candidate,
    }))
}

#[derive(Serialize)]
pub struct AcceptParagraphResponse {
    pub document: DocumentRow,
    pub versions: Vec<DocumentVersionRow>,
}

/// Accepting a paragraph candidate replaces that paragraph in the content,
/// appends a revised version and consumes the free revision.
async fn accept_paragraph(
    state: AppState,
    uuid: Uuid,
    paragraph_index: usize,
    text: String,
) -> Result<Json<AcceptParagraphResponse>, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "replacement text must not be empty".to_string(),
        ));
    }

    let document = store::get_document(&state.db, uuid).await?;
    let content = document
        .content
        .as_deref()
        .ok_or_else(|| AppError::Validation("document has no content to revise".to_string()))?;

    ensure_revision_available(&state.db, &state.cache, uuid).await?;

    let _lease = state
        .inflight
        .try_acquire(uuid)
        .ok_or(AppError::GenerationInFlight(uuid))?;

    let new_content =
        replace_paragraph(content, paragraph_index, &text).map_err(AppError::Validation)?;
    let settings_value = json!({ "scope": "paragraph", "paragraph_index": paragraph_index });

    persist_revision(
        &state.db,
        &state.cache,
        &document,
        &new_content,
        document.ai_workflow_id.as_deref(),
        Some(settings_value),
    )
    .await?;

    let document = store::get_document(&state.db, uuid).await?;
    let versions = store::list_versions(&state.db, uuid).await?;
    Ok(Json(AcceptParagraphResponse { document, versions }))
}
