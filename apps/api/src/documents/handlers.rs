use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::documents::compare::{compare, LineDiff};
use crate::documents::store::{self, DocumentPatch, NewDocument};
use crate::errors::AppError;
use crate::generation::wordcount::word_count;
use crate::models::document::{DocumentKind, DocumentRow, DocumentVersionRow};
use crate::modules::selection::{
    completeness_report, missing_summary, CompletenessReport, ModuleSelection,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub document_type: String,
    pub title: Option<String>,
    pub form_data: Value,
    pub module_selection: Option<Value>,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateResumeRequest {
    pub title: Option<String>,
    pub form_data: Value,
    pub module_selection: Option<Value>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document: DocumentRow,
    pub completeness: CompletenessReport,
}

fn default_title(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::CoverLetter => "Untitled cover letter",
        DocumentKind::Resume => "Untitled resume",
        DocumentKind::Sop => "Untitled statement of purpose",
    }
}

/// Parses the stored selection map back into its typed form.
pub fn stored_selection(document: &DocumentRow) -> Result<(DocumentKind, ModuleSelection), AppError> {
    let kind = document
        .kind()
        .ok_or_else(|| anyhow::anyhow!("document {} has unknown type", document.id))?;
    let selection = ModuleSelection::from_value(kind, &document.module_selection)
        .map_err(|e| anyhow::anyhow!("stored selection for {} is invalid: {e}", document.id))?;
    Ok((kind, selection))
}

async fn create_impl(
    state: &AppState,
    kind: DocumentKind,
    title: Option<String>,
    form_data: Value,
    module_selection: Option<Value>,
    language: Option<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let selection = match module_selection {
        Some(value) => {
            ModuleSelection::from_value(kind, &value).map_err(AppError::Validation)?
        }
        None => ModuleSelection::default_for(kind),
    };

    let report = completeness_report(kind, &selection, &form_data);
    if !report.can_generate {
        return Err(AppError::Validation(format!(
            "form data incomplete, missing: {}",
            missing_summary(&report)
        )));
    }

    let title = title.unwrap_or_else(|| default_title(kind).to_string());
    let language = language.unwrap_or_else(|| "en".to_string());
    let document = store::create_document(
        &state.db,
        NewDocument {
            kind,
            title: &title,
            form_data: &form_data,
            module_selection: selection.as_value(),
            language: &language,
        },
    )
    .await?;

    Ok(Json(DocumentResponse {
        document,
        completeness: report,
    }))
}

/// POST /api/documents
pub async fn handle_create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let kind = DocumentKind::parse(&req.document_type)
        .ok_or_else(|| AppError::Validation(format!("unknown document_type '{}'", req.document_type)))?;
    create_impl(
        &state,
        kind,
        req.title,
        req.form_data,
        req.module_selection,
        req.language,
    )
    .await
}

/// POST /api/documents/resume
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    create_impl(
        &state,
        DocumentKind::Resume,
        req.title,
        req.form_data,
        req.module_selection,
        req.language,
    )
    .await
}

#[derive(Deserialize)]
pub struct UpdateDocumentRequest {
    pub uuid: Uuid,
    pub title: Option<String>,
    pub form_data: Option<Value>,
    pub module_selection: Option<Value>,
    pub content: Option<String>,
    pub language: Option<String>,
}

/// PUT /api/documents
pub async fn handle_update_document(
    State(state): State<AppState>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let existing = store::get_document(&state.db, req.uuid).await?;
    let (kind, _) = stored_selection(&existing)?;

    let module_selection = match req.module_selection {
        Some(value) => Some(
            ModuleSelection::from_value(kind, &value)
                .map_err(AppError::Validation)?
                .as_value(),
        ),
        None => None,
    };

    // Manually edited content gets its word count recomputed in the
    // document's (possibly updated) language.
    let language = req.language.clone().unwrap_or(existing.language.clone());
    let recount = req.content.as_deref().map(|c| word_count(c, &language));

    let document = store::update_document(
        &state.db,
        req.uuid,
        DocumentPatch {
            title: req.title,
            form_data: req.form_data,
            module_selection,
            content: req.content,
            language: req.language,
        },
        recount,
    )
    .await?;

    let (kind, selection) = stored_selection(&document)?;
    let completeness = completeness_report(kind, &selection, &document.form_data);
    Ok(Json(DocumentResponse {
        document,
        completeness,
    }))
}

/// GET /api/documents/:uuid
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    let (kind, selection) = stored_selection(&document)?;
    let completeness = completeness_report(kind, &selection, &document.form_data);
    Ok(Json(DocumentResponse {
        document,
        completeness,
    }))
}

/// GET /api/documents/resume/:uuid
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    if document.kind() != Some(DocumentKind::Resume) {
        return Err(AppError::NotFound(format!("Resume {uuid} not found")));
    }
    let (kind, selection) = stored_selection(&document)?;
    let completeness = completeness_report(kind, &selection, &document.form_data);
    Ok(Json(DocumentResponse {
        document,
        completeness,
    }))
}

/// GET /api/documents/:uuid/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<DocumentVersionRow>>, AppError> {
    store::get_document(&state.db, uuid).await?;
    Ok(Json(store::list_versions(&state.db, uuid).await?))
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub from: i32,
    pub to: i32,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub from: i32,
    pub to: i32,
    pub lines: Vec<LineDiff>,
}

/// GET /api/documents/:uuid/versions/compare?from=&to=
pub async fn handle_compare_versions(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, AppError> {
    let from = store::get_version(&state.db, uuid, params.from).await?;
    let to = store::get_version(&state.db, uuid, params.to).await?;

    Ok(Json(CompareResponse {
        from: params.from,
        to: params.to,
        lines: compare(&from.content, &to.content),
    }))
}
