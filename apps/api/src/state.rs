use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::Cache;
use crate::checkout::client::PaymentClient;
use crate::config::Config;
use crate::workflow::client::WorkflowRunner;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: Cache,
    pub s3: S3Client,
    /// Pluggable workflow runner. Production: HttpWorkflowRunner against the
    /// external AI workflow service. Tests drive the orchestrator with a
    /// scripted runner instead.
    pub workflow: Arc<dyn WorkflowRunner>,
    pub payments: PaymentClient,
    pub config: Config,
    pub inflight: InflightGuard,
}

/// Tracks documents with a generation or revision currently running.
/// A second invocation for the same document is rejected while the first
/// holds its lease; the lease releases on drop, so completion, failure and
/// panic unwinding all clear the slot.
#[derive(Clone, Default)]
pub struct InflightGuard {
    running: Arc<Mutex<HashSet<Uuid>>>,
}

impl InflightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim the document. Returns `None` if a run is already
    /// in flight for it.
    pub fn try_acquire(&self, document_id: Uuid) -> Option<InflightLease> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(document_id) {
            return None;
        }
        Some(InflightLease {
            running: Arc::clone(&self.running),
            document_id,
        })
    }

    pub fn is_running(&self, document_id: Uuid) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&document_id)
    }
}

pub struct InflightLease {
    running: Arc<Mutex<HashSet<Uuid>>>,
    document_id: Uuid,
}

impl Drop for InflightLease {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.document_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected_while_lease_held() {
        let guard = InflightGuard::new();
        let id = Uuid::new_v4();

        let lease = guard.try_acquire(id);
        assert!(lease.is_some());
        assert!(guard.try_acquire(id).is_none());
        assert!(guard.is_running(id));
    }

    #[test]
    fn test_lease_drop_releases_slot() {
        let guard = InflightGuard::new();
        let id = Uuid::new_v4();

        let lease = guard.try_acquire(id);
        drop(lease);

        assert!(!guard.is_running(id));
        assert!(guard.try_acquire(id).is_some());
    }

    #[test]
    fn test_distinct_documents_do_not_contend() {
        let guard = InflightGuard::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let _lease_a = guard.try_acquire(a);
        assert!(guard.try_acquire(b).is_some());
    }
}
