//! Server-side wizard drafts. The wizard writes its in-progress state here
//! on every change and reads it back once on mount. Last write wins; drafts
//! expire with the cache TTL and are never authoritative for anything.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DraftQuery {
    pub client_id: String,
}

fn parse_kind(raw: &str) -> Result<DocumentKind, AppError> {
    DocumentKind::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("unknown document type: {raw}")))
}

fn require_client_id(query: &DraftQuery) -> Result<&str, AppError> {
    let id = query.client_id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("client_id is required".to_string()));
    }
    Ok(id)
}

/// GET /api/drafts/:document_type?client_id=
///
/// A missing draft is the normal first-visit case, so it comes back as
/// `draft: null` rather than 404.
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(document_type): Path<String>,
    Query(query): Query<DraftQuery>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&document_type)?;
    let client_id = require_client_id(&query)?;

    let draft = state.cache.get_draft(kind.as_str(), client_id).await;
    Ok(Json(json!({ "draft": draft })))
}

/// PUT /api/drafts/:document_type?client_id=
pub async fn handle_put_draft(
    State(state): State<AppState>,
    Path(document_type): Path<String>,
    Query(query): Query<DraftQuery>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&document_type)?;
    let client_id = require_client_id(&query)?;

    let Value::Object(mut draft) = body else {
        return Err(AppError::Validation(
            "draft body must be a JSON object".to_string(),
        ));
    };
    draft.insert("saved_at".to_string(), json!(Utc::now()));
    let value = Value::Object(draft);

    state.cache.put_draft(kind.as_str(), client_id, &value).await;
    Ok(Json(json!({ "draft": value })))
}
