//! Redis-backed caches: the revision-entitlement read-through cache and the
//! wizard draft store. Every operation here is advisory. A Redis failure is
//! logged and treated as a miss; the Postgres row is always the source of
//! truth for the entitlement flag.

use redis::AsyncCommands;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Drafts survive a month of inactivity before Redis reclaims them.
const DRAFT_TTL_SECS: u64 = 60 * 60 * 24 * 30;

#[derive(Clone)]
pub struct Cache {
    client: redis::Client,
}

impl Cache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Option<redis::aio::MultiplexedConnection> {
        match self.client.get_multiplexed_async_connection().await {
            Ok(con) => Some(con),
            Err(e) => {
                warn!("Redis connection failed, treating as cache miss: {e}");
                None
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Entitlement cache
    //
    // Only the used=true state is ever cached. The flag is irreversible,
    // so a cached true can never go stale in the dangerous direction; a
    // cached false could, which is why false is never written.
    // ────────────────────────────────────────────────────────────────────

    fn revision_key(document_id: Uuid) -> String {
        format!("revision_used:{document_id}")
    }

    /// Returns `Some(true)` if the cache knows the free revision was used.
    /// A miss or a Redis failure returns `None`; callers then consult the row.
    pub async fn revision_used(&self, document_id: Uuid) -> Option<bool> {
        let mut con = self.connection().await?;
        match con.get::<_, Option<String>>(Self::revision_key(document_id)).await {
            Ok(Some(_)) => Some(true),
            Ok(None) => None,
            Err(e) => {
                warn!("Redis GET failed for entitlement: {e}");
                None
            }
        }
    }

    pub async fn mark_revision_used(&self, document_id: Uuid) {
        let Some(mut con) = self.connection().await else {
            return;
        };
        if let Err(e) = con
            .set::<_, _, ()>(Self::revision_key(document_id), "1")
            .await
        {
            warn!("Redis SET failed for entitlement: {e}");
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Draft store — server-side persisted wizard state, last-write-wins
    // ────────────────────────────────────────────────────────────────────

    fn draft_key(document_type: &str, client_id: &str) -> String {
        format!("draft:{document_type}:{client_id}")
    }

    pub async fn get_draft(&self, document_type: &str, client_id: &str) -> Option<Value> {
        let mut con = self.connection().await?;
        match con
            .get::<_, Option<String>>(Self::draft_key(document_type, client_id))
            .await
        {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Stored draft is not valid JSON, dropping: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Redis GET failed for draft: {e}");
                None
            }
        }
    }

    pub async fn put_draft(&self, document_type: &str, client_id: &str, draft: &Value) {
        let Some(mut con) = self.connection().await else {
            return;
        };
        let raw = draft.to_string();
        if let Err(e) = con
            .set_ex::<_, _, ()>(Self::draft_key(document_type, client_id), raw, DRAFT_TTL_SECS)
            .await
        {
            warn!("Redis SETEX failed for draft: {e}");
        }
    }
}
