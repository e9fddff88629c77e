//! The single-use free revision gate.
//!
//! The stored row is authoritative. The Redis cache only ever holds the
//! used state: the flag never reverts, so a cached `true` is trusted
//! outright, while the available state is always re-read from the row.

use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::Cache;
use crate::documents::store;
use crate::errors::AppError;

/// Decision core. A cached `true` or a set stored flag means used.
pub fn is_revision_used(cached: Option<bool>, stored: bool) -> bool {
    cached == Some(true) || stored
}

/// Rejects with `REVISION_USED` when the free revision is gone. Consulted
/// before any revision workflow call.
pub async fn ensure_revision_available(
    db: &PgPool,
    cache: &Cache,
    document_id: Uuid,
) -> Result<(), AppError> {
    let cached = cache.revision_used(document_id).await;

    let stored = match cached {
        // Short-circuit: the row cannot contradict a used flag.
        Some(true) => false,
        _ => {
            let flag: Option<bool> = sqlx::query_scalar(
                "SELECT has_used_free_revision FROM documents WHERE id = $1",
            )
            .bind(document_id)
            .fetch_optional(db)
            .await?;
            flag.ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?
        }
    };

    if is_revision_used(cached, stored) {
        if stored {
            // Re-sync the cache with the authoritative row.
            cache.mark_revision_used(document_id).await;
        }
        return Err(AppError::RevisionUsed);
    }

    Ok(())
}

/// Permanently consumes the entitlement: flips the row flag and overwrites
/// any cached value.
pub async fn consume_free_revision(
    db: &PgPool,
    cache: &Cache,
    document_id: Uuid,
) -> Result<(), AppError> {
    store::mark_revision_used(db, document_id).await?;
    cache.mark_revision_used(document_id).await;
    Ok(())
}
