//! Document persistence. All sqlx access for documents and their versions
//! lives here; handlers and the orchestrator compose these primitives.

use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::{DocumentKind, DocumentRow, DocumentVersionRow, VersionType};

pub struct NewDocument<'a> {
    pub kind: DocumentKind,
    pub title: &'a str,
    pub form_data: &'a Value,
    pub module_selection: Value,
    pub language: &'a str,
}

pub async fn create_document(
    pool: &PgPool,
    new: NewDocument<'_>,
) -> Result<DocumentRow, AppError> {
    let id = Uuid::new_v4();
    let row: DocumentRow = sqlx::query_as(
        r#"
        INSERT INTO documents (id, document_type, title, form_data, module_selection, language)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(new.kind.as_str())
    .bind(new.title)
    .bind(new.form_data)
    .bind(&new.module_selection)
    .bind(new.language)
    .fetch_one(pool)
    .await?;

    info!("Created {} document {id}", new.kind.as_str());
    Ok(row)
}

pub async fn get_document(pool: &PgPool, id: Uuid) -> Result<DocumentRow, AppError> {
    sqlx::query_as("SELECT * FROM documents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}

pub struct DocumentPatch {
    pub title: Option<String>,
    pub form_data: Option<Value>,
    pub module_selection: Option<Value>,
    pub content: Option<String>,
    pub language: Option<String>,
}

/// Applies a partial update. Word count for manually edited content is
/// recomputed by the caller, which knows the document language.
pub async fn update_document(
    pool: &PgPool,
    id: Uuid,
    patch: DocumentPatch,
    word_count: Option<i32>,
) -> Result<DocumentRow, AppError> {
    let existing = get_document(pool, id).await?;

    let title = patch.title.unwrap_or(existing.title);
    let form_data = patch.form_data.unwrap_or(existing.form_data);
    let module_selection = patch.module_selection.unwrap_or(existing.module_selection);
    let language = patch.language.unwrap_or(existing.language);
    let content = patch.content.or(existing.content);
    let word_count = word_count.unwrap_or(existing.word_count);

    let row: DocumentRow = sqlx::query_as(
        r#"
        UPDATE documents
        SET title = $2, form_data = $3, module_selection = $4, content = $5,
            word_count = $6, language = $7, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(form_data)
    .bind(module_selection)
    .bind(content)
    .bind(word_count)
    .bind(language)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Writes generated or revised content onto the document. The run id is
/// null for fallback-assembled content.
pub async fn update_content(
    pool: &PgPool,
    id: Uuid,
    content: &str,
    word_count: i32,
    run_id: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE documents
        SET content = $2, word_count = $3, ai_workflow_id = $4, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(content)
    .bind(word_count)
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Permanently flips the single-use free revision flag.
pub async fn mark_revision_used(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE documents SET has_used_free_revision = TRUE, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_versions(
    pool: &PgPool,
    document_id: Uuid,
) -> Result<Vec<DocumentVersionRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM document_versions WHERE document_id = $1 ORDER BY version ASC",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_version(
    pool: &PgPool,
    document_id: Uuid,
    version: i32,
) -> Result<DocumentVersionRow, AppError> {
    sqlx::query_as("SELECT * FROM document_versions WHERE document_id = $1 AND version = $2")
        .bind(document_id)
        .bind(version)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Version {version} not found for document {document_id}"
            ))
        })
}

pub async fn has_original_version(pool: &PgPool, document_id: Uuid) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM document_versions WHERE document_id = $1 AND version_type = 'original')",
    )
    .bind(document_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Next version number given the current maximum. Versions start at 1 and
/// strictly increase per document.
pub fn next_version_number(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Which write is persisting content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A finished generation, workflow-produced or fallback-assembled.
    Generation,
    /// An accepted revision, whole-document or paragraph.
    Revision,
}

/// The version row a persisted outcome appends, if any. The first finished
/// generation appends the original row; regeneration overwrites content
/// without growing the history; every accepted revision appends a revised
/// row.
pub fn version_type_for(outcome: PersistOutcome, has_original: bool) -> Option<VersionType> {
    match outcome {
        PersistOutcome::Generation if has_original => None,
        PersistOutcome::Generation => Some(VersionType::Original),
        PersistOutcome::Revision => Some(VersionType::Revised),
    }
}

/// Appends a version row. Version numbers are computed as MAX + 1 so the
/// sequence stays strictly increasing regardless of deleted history.
pub async fn append_version(
    pool: &PgPool,
    document_id: Uuid,
    version_type: VersionType,
    content: &str,
    word_count: i32,
    revision_settings: Option<&Value>,
) -> Result<DocumentVersionRow, AppError> {
    let current_max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM document_versions WHERE document_id = $1")
            .bind(document_id)
            .fetch_one(pool)
            .await?;
    let new_version = next_version_number(current_max);

    let row: DocumentVersionRow = sqlx::query_as(
        r#"
        INSERT INTO document_versions
            (id, document_id, version, version_type, content, word_count, revision_settings)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(document_id)
    .bind(new_version)
    .bind(version_type.as_str())
    .bind(content)
    .bind(word_count)
    .bind(revision_settings)
    .fetch_one(pool)
    .await?;

    info!(
        "Appended {} version {new_version} for document {document_id}",
        version_type.as_str()
    );
    Ok(row)
}
