//! Remote session storage.
//!
//! Every call may fail; callers treat a failure as "remote unavailable",
//! never as data loss.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::storage::{sort_newest_first, SessionRecord};

/// Owner-scoped document store for session records.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create or replace the document `record.id`, tagged with `owner_id`.
    async fn put(&self, owner_id: &str, record: &SessionRecord) -> Result<(), RemoteError>;

    /// Every record of `owner_id`, newest `started_at` first.
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<SessionRecord>, RemoteError>;

    /// Remove one document. Removing a missing document succeeds.
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;

    /// Remove every document of `owner_id`.
    async fn batch_delete_by_owner(&self, owner_id: &str) -> Result<(), RemoteError>;
}

/// In-process remote with switchable failure, for offline use and tests.
#[derive(Default)]
pub struct MemoryRemoteStore {
    docs: Mutex<HashMap<String, SessionRecord>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with [`RemoteError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls made, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.docs.lock().ok()?.get(id).cloned()
    }

    /// Store a document directly, as if written by another device.
    pub fn insert(&self, record: SessionRecord) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(record.id.clone(), record);
        }
    }

    fn check(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("remote is offline".into()));
        }
        Ok(())
    }

    fn docs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>, RemoteError> {
        self.docs
            .lock()
            .map_err(|_| RemoteError::Unavailable("remote state poisoned".into()))
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn put(&self, owner_id: &str, record: &SessionRecord) -> Result<(), RemoteError> {
        self.check()?;
        let mut doc = record.clone();
        doc.owner_id = Some(owner_id.to_string());
        self.docs()?.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<SessionRecord>, RemoteError> {
        self.check()?;
        let mut records: Vec<SessionRecord> = self
            .docs()?
            .values()
            .filter(|r| r.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.check()?;
        self.docs()?.remove(id);
        Ok(())
    }

    async fn batch_delete_by_owner(&self, owner_id: &str) -> Result<(), RemoteError> {
        self.check()?;
        self.docs()?
            .retain(|_, r| r.owner_id.as_deref() != Some(owner_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionType;
    use chrono::{Duration, Utc};

    fn rec(minutes_ago: i64) -> SessionRecord {
        let start = Utc::now() - Duration::minutes(minutes_ago);
        SessionRecord::new(SessionType::Work, 25, 25, true, Some(start), None)
    }

    #[tokio::test]
    async fn put_tags_owner_and_query_filters() {
        let remote = MemoryRemoteStore::new();
        let a = rec(30);
        let b = rec(10);
        remote.put("u1", &a).await.unwrap();
        remote.put("u1", &b).await.unwrap();
        remote.put("u2", &rec(5)).await.unwrap();

        let mine = remote.query_by_owner("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, b.id);
        assert_eq!(mine[0].owner_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn batch_delete_only_touches_owner() {
        let remote = MemoryRemoteStore::new();
        remote.put("u1", &rec(1)).await.unwrap();
        remote.put("u2", &rec(2)).await.unwrap();
        remote.batch_delete_by_owner("u1").await.unwrap();
        assert_eq!(remote.len(), 1);
        assert!(remote.query_by_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_remote_rejects_every_call() {
        let remote = MemoryRemoteStore::new();
        remote.set_failing(true);
        assert!(remote.put("u1", &rec(1)).await.is_err());
        assert!(remote.query_by_owner("u1").await.is_err());
        assert!(remote.delete("x").await.is_err());
        assert_eq!(remote.call_count(), 3);
        assert!(remote.is_empty());
    }
}
