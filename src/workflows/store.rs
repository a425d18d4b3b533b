// Owned in-memory repository for workflow records.
//
// Transitions validate and write under a single write lock, so the status a
// transition function sees is the status it replaces.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::{Result, WorkflowError};
use super::types::{RequestId, WorkflowAction, WorkflowRecord};

/// Record before and after a committed transition
#[derive(Debug, Clone)]
pub struct Transitioned<T> {
    pub previous: T,
    pub current: T,
}

#[derive(Debug)]
pub struct RecordStore<T> {
    records: RwLock<HashMap<RequestId, T>>,
}

impl<T: WorkflowRecord> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WorkflowRecord> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, record: T) -> T {
        let mut records = self.records.write().await;
        debug!(kind = T::KIND, request_id = %record.id(), "Persisting new record");
        records.insert(record.id(), record.clone());
        record
    }

    pub async fn get(&self, id: RequestId) -> Result<T> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound { request_id: id })
    }

    pub async fn list(&self) -> Vec<T> {
        let mut all: Vec<T> = self.records.read().await.values().cloned().collect();
        all.sort_by_key(|r| (r.requested_at(), r.id()));
        all
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Apply `f` to the current record and commit its result atomically.
    /// Nothing is written when `f` fails.
    pub async fn transition<F>(&self, id: RequestId, f: F) -> Result<Transitioned<T>>
    where
        F: FnOnce(&T) -> Result<T>,
    {
        let mut records = self.records.write().await;
        let current = records
            .get(&id)
            .ok_or(WorkflowError::NotFound { request_id: id })?;

        let mut next = f(current)?;
        next.bump_version();
        let previous = records.insert(id, next.clone()).unwrap_or_else(|| next.clone());

        debug!(
            kind = T::KIND,
            request_id = %id,
            from = previous.status_label(),
            to = next.status_label(),
            version = next.version(),
            "Committed transition"
        );
        Ok(Transitioned {
            previous,
            current: next,
        })
    }

    /// Like `transition`, but only if the record is still at `expected_version`.
    /// A stale version means another writer got there first.
    pub async fn transition_if_version<F>(
        &self,
        id: RequestId,
        expected_version: u64,
        action: WorkflowAction,
        f: F,
    ) -> Result<Transitioned<T>>
    where
        F: FnOnce(&T) -> Result<T>,
    {
        self.transition(id, |current| {
            if current.version() != expected_version {
                return Err(WorkflowError::InvalidStateTransition {
                    request_id: id,
                    from: current.status_label(),
                    action,
                });
            }
            f(current)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::gate::GateStatus;
    use crate::workflows::release::ReleaseRequest;
    use crate::workflows::types::{BranchId, LineItem};
    use chrono::Utc;
    use std::sync::Arc;

    fn release() -> ReleaseRequest {
        ReleaseRequest::request(
            BranchId::new("BR001"),
            "clerk",
            vec![LineItem::new("7", "Insulin", 1)],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let store: RecordStore<ReleaseRequest> = RecordStore::new();
        let id = RequestId::new();
        assert_eq!(store.get(id).await.unwrap_err(), WorkflowError::NotFound { request_id: id });
    }

    #[tokio::test]
    async fn test_failed_transition_writes_nothing() {
        let store = RecordStore::new();
        let record = store.insert(release()).await;

        let result = store
            .transition(record.id, |_| Err(WorkflowError::EmptyItemSet))
            .await;
        assert!(result.is_err());

        let stored = store.get(record.id).await.unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.status, GateStatus::Pending);
    }

    #[tokio::test]
    async fn test_transition_bumps_version() {
        let store = RecordStore::new();
        let record = store.insert(release()).await;

        let done = store
            .transition(record.id, |r| r.authorize("pharmacist", Utc::now()))
            .await
            .unwrap();
        assert_eq!(done.previous.version, 0);
        assert_eq!(done.current.version, 1);
        assert_eq!(done.current.status, GateStatus::Authorized);
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let store = RecordStore::new();
        let record = store.insert(release()).await;
        store
            .transition(record.id, |r| Ok(r.clone()))
            .await
            .unwrap();

        let err = store
            .transition_if_version(record.id, 0, WorkflowAction::AuthorizeRelease, |r| {
                r.authorize("pharmacist", Utc::now())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStateTransition { .. }));
        assert_eq!(store.get(record.id).await.unwrap().status, GateStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_authorize_single_winner() {
        let store = Arc::new(RecordStore::new());
        let record = store.insert(release()).await;

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .transition(record.id, |r| r.authorize(&format!("pharmacist-{n}"), Utc::now()))
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.get(record.id).await.unwrap().version, 1);
    }
}
