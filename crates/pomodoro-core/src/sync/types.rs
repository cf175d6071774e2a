//! Core types for best-effort remote synchronization.

use serde::{Deserialize, Serialize};

/// What happened on the remote side of a store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RemoteSync {
    /// No owner, or the store runs local-only.
    Skipped,
    /// The remote acknowledged the write.
    Synced,
    /// The remote call failed; the operation is queued for retry.
    Failed(String),
}

impl RemoteSync {
    pub fn is_failed(&self) -> bool {
        matches!(self, RemoteSync::Failed(_))
    }
}

/// Result of [`SessionStore::save`](crate::SessionStore::save).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub id: String,
    pub remote: RemoteSync,
}

/// Result of [`SessionStore::delete`](crate::SessionStore::delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Whether a local copy existed and was removed.
    pub removed_locally: bool,
    pub remote: RemoteSync,
}

/// A remote write that failed and waits in the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PendingOp {
    /// Re-send the current local copy of `id`.
    Put { id: String, owner_id: String },
    /// Remove `id` from the remote.
    Delete { id: String, owner_id: String },
}

impl PendingOp {
    pub fn id(&self) -> &str {
        match self {
            PendingOp::Put { id, .. } | PendingOp::Delete { id, .. } => id,
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            PendingOp::Put { owner_id, .. } | PendingOp::Delete { owner_id, .. } => owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_sync_serializes_with_reason() {
        let json = serde_json::to_value(RemoteSync::Failed("timeout".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");
        let json = serde_json::to_value(RemoteSync::Synced).unwrap();
        assert_eq!(json["status"], "synced");
    }

    #[test]
    fn pending_op_accessors() {
        let op = PendingOp::Delete {
            id: "a".into(),
            owner_id: "u1".into(),
        };
        assert_eq!(op.id(), "a");
        assert_eq!(op.owner_id(), "u1");
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"delete\""));
    }
}
