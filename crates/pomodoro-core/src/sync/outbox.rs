//! Persisted queue of remote operations that have not succeeded yet.
//!
//! At most one operation is kept per session id: a later put or delete for the
//! same id replaces the earlier one, since only the final state matters. Every
//! enqueue gets a fresh sequence number, so a replay can tell the entries it
//! sent apart from identical ones queued while it was running.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::storage::local::decode_json_or_default;
use crate::sync::types::PendingOp;

pub(crate) const PENDING_OPS_KEY: &str = "pending_remote_ops";

/// A queued operation tagged with its enqueue sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOp {
    pub seq: u64,
    #[serde(flatten)]
    pub op: PendingOp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbox {
    /// Never reset, even when the queue drains.
    #[serde(default)]
    next_seq: u64,
    #[serde(default)]
    ops: Vec<QueuedOp>,
}

impl Outbox {
    /// Decode a serialized outbox; unreadable data yields an empty outbox.
    pub fn decode(raw: Option<&str>) -> Self {
        decode_json_or_default(raw, "pending remote operations")
    }

    pub fn entries(&self) -> &[QueuedOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queue an operation, replacing any earlier one for the same id.
    pub fn enqueue(&mut self, op: PendingOp) -> u64 {
        self.ops.retain(|existing| existing.op.id() != op.id());
        self.next_seq += 1;
        self.ops.push(QueuedOp {
            seq: self.next_seq,
            op,
        });
        self.next_seq
    }

    /// Drop any queued operation for `id`.
    pub fn forget(&mut self, id: &str) {
        self.ops.retain(|queued| queued.op.id() != id);
    }

    /// Drop the entries with these sequence numbers. Entries re-queued since
    /// carry a newer number and stay.
    pub fn remove_seqs(&mut self, seqs: &HashSet<u64>) {
        self.ops.retain(|queued| !seqs.contains(&queued.seq));
    }

    /// Operations queued for one owner, oldest first.
    pub fn for_owner(&self, owner_id: &str) -> Vec<QueuedOp> {
        self.ops
            .iter()
            .filter(|queued| queued.op.owner_id() == owner_id)
            .cloned()
            .collect()
    }

    /// Ids whose remote copy is scheduled for deletion.
    pub fn pending_deletes(&self, owner_id: &str) -> HashSet<String> {
        self.ops
            .iter()
            .filter_map(|queued| match &queued.op {
                PendingOp::Delete { id, owner_id: o } if o == owner_id => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drop every queued operation that belongs to `owner_id`.
    pub fn clear_owner(&mut self, owner_id: &str) {
        self.ops.retain(|queued| queued.op.owner_id() != owner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(id: &str, owner: &str) -> PendingOp {
        PendingOp::Put {
            id: id.into(),
            owner_id: owner.into(),
        }
    }

    fn delete(id: &str, owner: &str) -> PendingOp {
        PendingOp::Delete {
            id: id.into(),
            owner_id: owner.into(),
        }
    }

    #[test]
    fn later_op_replaces_earlier_for_same_id() {
        let mut outbox = Outbox::default();
        outbox.enqueue(put("a", "u1"));
        outbox.enqueue(put("b", "u1"));
        outbox.enqueue(delete("a", "u1"));
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.entries()[1].op, delete("a", "u1"));
        assert_eq!(outbox.entries()[1].seq, 3);
    }

    #[test]
    fn pending_deletes_are_scoped_to_owner() {
        let mut outbox = Outbox::default();
        outbox.enqueue(delete("a", "u1"));
        outbox.enqueue(delete("b", "u2"));
        outbox.enqueue(put("c", "u1"));
        let deletes = outbox.pending_deletes("u1");
        assert_eq!(deletes.len(), 1);
        assert!(deletes.contains("a"));
        assert_eq!(outbox.for_owner("u1").len(), 2);
    }

    #[test]
    fn forget_and_clear_owner() {
        let mut outbox = Outbox::default();
        outbox.enqueue(put("a", "u1"));
        outbox.enqueue(put("b", "u2"));
        outbox.forget("a");
        assert_eq!(outbox.len(), 1);
        outbox.clear_owner("u2");
        assert!(outbox.is_empty());
    }

    #[test]
    fn requeued_identical_op_survives_prune() {
        let mut outbox = Outbox::default();
        outbox.enqueue(put("a", "u1"));
        outbox.enqueue(put("b", "u1"));
        let replayed: HashSet<u64> = outbox.for_owner("u1").iter().map(|q| q.seq).collect();

        // Same op fails again while the replay is in flight.
        outbox.enqueue(put("a", "u1"));
        outbox.remove_seqs(&replayed);

        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.entries()[0].op, put("a", "u1"));
    }

    #[test]
    fn sequence_survives_draining_and_reload() {
        let mut outbox = Outbox::default();
        let first = outbox.enqueue(put("a", "u1"));
        outbox.forget("a");
        let json = serde_json::to_string(&outbox).unwrap();

        let mut reloaded = Outbox::decode(Some(&json));
        assert!(reloaded.is_empty());
        assert!(reloaded.enqueue(put("a", "u1")) > first);
    }

    #[test]
    fn serialized_entries_are_flat() {
        let mut outbox = Outbox::default();
        outbox.enqueue(delete("a", "u1"));
        let json = serde_json::to_value(&outbox).unwrap();
        assert_eq!(json["ops"][0]["op"], "delete");
        assert_eq!(json["ops"][0]["seq"], 1);
        assert_eq!(json["ops"][0]["owner_id"], "u1");
    }

    #[test]
    fn corrupt_payload_decodes_empty() {
        assert!(Outbox::decode(Some("nope")).is_empty());
        assert!(Outbox::decode(None).is_empty());
    }
}
