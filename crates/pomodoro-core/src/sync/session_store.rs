//! Session history with a best-effort bridge to remote storage.
//!
//! Local storage is the source of truth for this device: every operation
//! writes locally first and its success depends only on that write. When an
//! owner is known and a remote is configured, the same change is sent to the
//! remote; failures are logged, queued in the outbox and replayed by the next
//! owner-scoped call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{CoreError, RemoteError, StorageError};
use crate::stats::{RemoteStats, SessionStats};
use crate::storage::{new_session_id, sort_newest_first, Config, LocalStore, SessionRecord};
use crate::sync::http::HttpRemoteStore;
use crate::sync::outbox::{Outbox, PENDING_OPS_KEY};
use crate::sync::remote::RemoteStore;
use crate::sync::types::{DeleteOutcome, PendingOp, RemoteSync, SaveOutcome};

const USER_ID_KEY: &str = "current_user_id";

pub struct SessionStore {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    /// Serializes read-modify-write cycles on local data.
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// A store that never talks to a remote.
    pub fn local_only(local: Arc<dyn LocalStore>) -> Self {
        Self {
            local,
            remote: None,
            write_lock: Mutex::new(()),
        }
    }

    /// A store that mirrors owner-scoped changes to `remote`.
    pub fn synced(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local,
            remote: Some(remote),
            write_lock: Mutex::new(()),
        }
    }

    /// Pick local-only or synced from `config.remote`.
    ///
    /// # Errors
    /// Returns an error if the remote is enabled but its URL is invalid.
    pub fn from_config(config: &Config, local: Arc<dyn LocalStore>) -> Result<Self, CoreError> {
        if !config.remote.enabled {
            return Ok(Self::local_only(local));
        }
        let remote = HttpRemoteStore::from_config(&config.remote)?;
        Ok(Self::synced(local, Arc::new(remote)))
    }

    pub fn is_synced(&self) -> bool {
        self.remote.is_some()
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Last signed-in owner, if any.
    pub fn current_owner(&self) -> Option<String> {
        self.local
            .read_meta(USER_ID_KEY)
            .filter(|id| !id.trim().is_empty())
    }

    /// Remember `owner_id` as the signed-in owner.
    ///
    /// # Errors
    /// Returns an error if the local write fails.
    pub fn sign_in(&self, owner_id: &str) -> Result<(), CoreError> {
        if owner_id.trim().is_empty() {
            return Err(crate::error::ValidationError::invalid("owner_id", "must not be empty").into());
        }
        self.local.write_meta(USER_ID_KEY, Some(owner_id))?;
        tracing::info!(owner_id, "signed in");
        Ok(())
    }

    /// Forget the signed-in owner. Local history is kept.
    ///
    /// # Errors
    /// Returns an error if the local write fails.
    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.local.write_meta(USER_ID_KEY, None)?;
        tracing::info!("signed out");
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record a finished session.
    ///
    /// The record keeps its id (a new one is minted only if it has none) and
    /// is tagged with `owner_id`. Succeeds once the local write succeeds.
    ///
    /// # Errors
    /// Returns an error only if the local write fails.
    pub async fn save(
        &self,
        mut record: SessionRecord,
        owner_id: Option<&str>,
    ) -> Result<SaveOutcome, CoreError> {
        if record.id.trim().is_empty() {
            record.id = new_session_id();
        }
        if let Some(owner) = owner_id {
            record.owner_id = Some(owner.to_string());
        }

        {
            let _guard = self.lock()?;
            let mut records = self.local.read_all();
            records.retain(|r| r.id != record.id);
            records.push(record.clone());
            sort_newest_first(&mut records);
            self.local.write_all(&records)?;
        }
        tracing::debug!(id = %record.id, "session saved locally");

        let remote = match self.remote_for(owner_id) {
            Some((remote, owner)) => {
                self.replay_outbox(remote, owner).await;
                let result = remote.put(owner, &record).await;
                self.settle(result, PendingOp::Put {
                    id: record.id.clone(),
                    owner_id: owner.to_string(),
                })
            }
            None => RemoteSync::Skipped,
        };

        Ok(SaveOutcome {
            id: record.id,
            remote,
        })
    }

    /// Replace the record with the same id.
    ///
    /// A record known only to the remote (synced from another device) is
    /// adopted into local storage with the edit applied.
    ///
    /// # Errors
    /// Returns an error if the record is invalid, neither layer has its id,
    /// or the local write fails.
    pub async fn update(
        &self,
        mut record: SessionRecord,
        owner_id: Option<&str>,
    ) -> Result<RemoteSync, CoreError> {
        record.validate()?;
        if let Some(owner) = owner_id {
            record.owner_id = Some(owner.to_string());
        }

        let known_locally = self.local.read_all().iter().any(|r| r.id == record.id);
        if !known_locally && !self.known_remotely(&record.id, owner_id).await {
            return Err(CoreError::NotFound(record.id));
        }

        {
            let _guard = self.lock()?;
            let mut records = self.local.read_all();
            records.retain(|r| r.id != record.id);
            records.push(record.clone());
            sort_newest_first(&mut records);
            self.local.write_all(&records)?;
        }
        tracing::debug!(id = %record.id, "session updated locally");

        let remote = match self.remote_for(owner_id) {
            Some((remote, owner)) => {
                self.replay_outbox(remote, owner).await;
                let result = remote.put(owner, &record).await;
                self.settle(result, PendingOp::Put {
                    id: record.id.clone(),
                    owner_id: owner.to_string(),
                })
            }
            None => RemoteSync::Skipped,
        };
        Ok(remote)
    }

    /// Delete a session locally and, best-effort, remotely.
    ///
    /// # Errors
    /// Returns an error only if the local write fails.
    pub async fn delete(&self, id: &str, owner_id: Option<&str>) -> Result<DeleteOutcome, CoreError> {
        let removed_locally = {
            let _guard = self.lock()?;
            let mut records = self.local.read_all();
            let before = records.len();
            records.retain(|r| r.id != id);
            let removed = records.len() != before;
            if removed {
                self.local.write_all(&records)?;
            }
            removed
        };
        tracing::debug!(id, removed_locally, "session deleted locally");

        let remote = match self.remote_for(owner_id) {
            Some((remote, owner)) => {
                self.replay_outbox(remote, owner).await;
                let result = remote.delete(id).await;
                self.settle(result, PendingOp::Delete {
                    id: id.to_string(),
                    owner_id: owner.to_string(),
                })
            }
            None => RemoteSync::Skipped,
        };

        Ok(DeleteOutcome {
            removed_locally,
            remote,
        })
    }

    /// Delete every remote session of `owner_id`. Local history is untouched.
    pub async fn clear_remote(&self, owner_id: &str) -> RemoteSync {
        let Some(remote) = &self.remote else {
            return RemoteSync::Skipped;
        };
        match remote.batch_delete_by_owner(owner_id).await {
            Ok(()) => {
                if let Err(e) = self.update_outbox(|outbox| outbox.clear_owner(owner_id)) {
                    tracing::warn!(error = %e, "failed to prune outbox");
                }
                RemoteSync::Synced
            }
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "remote batch delete failed");
                RemoteSync::Failed(e.to_string())
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Local and remote sessions merged by id, newest first.
    ///
    /// On an id collision the local copy wins: it carries the latest local
    /// edit even when the matching remote write has not landed yet. Remote
    /// copies with a queued delete are hidden.
    pub async fn list_all(&self, owner_id: Option<&str>) -> Vec<SessionRecord> {
        let mut merged = self.local.read_all();

        if let Some((remote, owner)) = self.remote_for(owner_id) {
            self.replay_outbox(remote, owner).await;
            match remote.query_by_owner(owner).await {
                Ok(remote_records) => {
                    let hidden = self.outbox().pending_deletes(owner);
                    let mut seen: HashSet<String> = merged.iter().map(|r| r.id.clone()).collect();
                    for record in remote_records {
                        if record.owner_id.as_deref().is_some_and(|o| o != owner) {
                            continue;
                        }
                        if hidden.contains(&record.id) || !seen.insert(record.id.clone()) {
                            continue;
                        }
                        merged.push(record);
                    }
                }
                Err(e) => {
                    tracing::warn!(owner_id = owner, error = %e, "remote query failed; showing local sessions only");
                }
            }
        }

        sort_newest_first(&mut merged);
        merged
    }

    pub async fn list_completed(&self, owner_id: Option<&str>) -> Vec<SessionRecord> {
        let mut sessions = self.list_all(owner_id).await;
        sessions.retain(|s| s.completed);
        sessions
    }

    pub async fn list_cancelled(&self, owner_id: Option<&str>) -> Vec<SessionRecord> {
        let mut sessions = self.list_all(owner_id).await;
        sessions.retain(|s| !s.completed);
        sessions
    }

    pub async fn stats(&self, owner_id: Option<&str>) -> SessionStats {
        SessionStats::from_sessions(&self.list_all(owner_id).await)
    }

    /// Totals over the remote copy only.
    ///
    /// # Errors
    /// Fails when no remote is configured or the remote query fails; there is
    /// no local substitute for this view.
    pub async fn remote_stats(&self, owner_id: &str) -> Result<RemoteStats, CoreError> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| RemoteError::Unavailable("remote sync is disabled".into()))?;
        let records = remote.query_by_owner(owner_id).await?;
        Ok(RemoteStats::from_sessions(&records))
    }

    /// Number of remote operations waiting for a retry.
    pub fn pending_remote_ops(&self) -> usize {
        self.outbox().len()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_lock.lock().map_err(|_| StorageError::Poisoned)
    }

    fn remote_for<'a>(&'a self, owner_id: Option<&'a str>) -> Option<(&'a dyn RemoteStore, &'a str)> {
        let remote = self.remote.as_deref()?;
        let owner = owner_id.filter(|o| !o.trim().is_empty())?;
        Some((remote, owner))
    }

    /// Whether the remote holds `id` for the owner. An unreachable remote
    /// counts as yes: the edit stays local and is queued like any other.
    async fn known_remotely(&self, id: &str, owner_id: Option<&str>) -> bool {
        let Some((remote, owner)) = self.remote_for(owner_id) else {
            return false;
        };
        if self.outbox().pending_deletes(owner).contains(id) {
            return false;
        }
        match remote.query_by_owner(owner).await {
            Ok(records) => records
                .iter()
                .any(|r| r.id == id && r.owner_id.as_deref().map_or(true, |o| o == owner)),
            Err(e) => {
                tracing::warn!(id, error = %e, "remote lookup failed; accepting edit locally");
                true
            }
        }
    }

    fn outbox(&self) -> Outbox {
        Outbox::decode(self.local.read_meta(PENDING_OPS_KEY).as_deref())
    }

    fn update_outbox(&self, f: impl FnOnce(&mut Outbox)) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        let mut outbox = self.outbox();
        f(&mut outbox);
        // Written even when empty so the sequence counter keeps counting.
        let json = serde_json::to_string(&outbox)?;
        self.local.write_meta(PENDING_OPS_KEY, Some(&json))?;
        Ok(())
    }

    /// Turn a remote result into an outcome, queueing the op on failure and
    /// clearing any stale queued op for the same id on success.
    fn settle(&self, result: Result<(), RemoteError>, op: PendingOp) -> RemoteSync {
        let id = op.id().to_string();
        match result {
            Ok(()) => {
                if let Err(e) = self.update_outbox(|outbox| outbox.forget(&id)) {
                    tracing::warn!(error = %e, "failed to prune outbox");
                }
                RemoteSync::Synced
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "remote write failed; queued for retry");
                if let Err(queue_err) = self.update_outbox(|outbox| {
                    outbox.enqueue(op);
                }) {
                    tracing::warn!(error = %queue_err, "failed to queue remote write");
                }
                RemoteSync::Failed(e.to_string())
            }
        }
    }

    /// Retry queued operations for `owner`. Stops at the first failure since
    /// the remote is evidently still unreachable.
    async fn replay_outbox(&self, remote: &dyn RemoteStore, owner: &str) {
        let pending = self.outbox().for_owner(owner);
        if pending.is_empty() {
            return;
        }

        let mut done = HashSet::new();
        for queued in &pending {
            let result = match &queued.op {
                PendingOp::Put { id, .. } => {
                    match self.local.read_all().into_iter().find(|r| &r.id == id) {
                        Some(record) => remote.put(owner, &record).await,
                        // Deleted locally since; nothing left to send.
                        None => Ok(()),
                    }
                }
                PendingOp::Delete { id, .. } => remote.delete(id).await,
            };
            match result {
                Ok(()) => {
                    done.insert(queued.seq);
                }
                Err(e) => {
                    tracing::debug!(error = %e, remaining = pending.len() - done.len(), "outbox replay stopped");
                    break;
                }
            }
        }

        if done.is_empty() {
            return;
        }
        tracing::info!(replayed = done.len(), "replayed queued remote operations");
        if let Err(e) = self.update_outbox(|outbox| outbox.remove_seqs(&done)) {
            tracing::warn!(error = %e, "failed to prune outbox");
        }
    }
}
