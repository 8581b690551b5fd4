//! # Edit/Stage Buffer
//!
//! Holds uncommitted field-level edits keyed by entity id + field name.
//!
//! ## Staging Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Edit/Stage Buffer                                 │
//! │                                                                         │
//! │  operator edit ───────┐                                                 │
//! │                       ▼                                                 │
//! │  accepted live diff ──► (entity_id, field) → value                      │
//! │                       ▲        last-write-wins per key                  │
//! │  rejected live diff ──┘ dropped, never staged                           │
//! │                                                                         │
//! │  commit() → edits grouped by entity → ReconciliationCommitter → DB      │
//! │  discard_all() → buffer cleared, nothing persisted                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Contract
//! Single-writer, single-reader within one editing session. The buffer is
//! never shared across sessions and carries no locking; the backing-store
//! commit is the sole point where concurrent writers are serialized.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::diff::VariantDiff;
use crate::RECENT_EDIT_WINDOW_SECS;

// =============================================================================
// Staged Edit Types
// =============================================================================

/// All staged fields for one entity, as handed to the committer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEdits {
    pub entity_id: i64,
    pub fields: BTreeMap<String, Value>,
}

/// Per-entity "recently touched" bookkeeping.
///
/// Fields staged within a trailing 60-second window from the first edit of
/// that window accumulate into one set. This is a display convenience for
/// highlighting, NOT a conflict-resolution mechanism.
#[derive(Debug, Clone)]
struct RecentEdits {
    window_started_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
    fields: BTreeSet<String>,
}

// =============================================================================
// Edit Buffer
// =============================================================================

/// In-memory buffer of uncommitted edits for one editing session.
///
/// Never persisted: cleared on successful commit or explicit discard.
#[derive(Debug, Default)]
pub struct EditBuffer {
    /// entity → field → staged value, last write wins per key.
    edits: BTreeMap<i64, BTreeMap<String, Value>>,

    /// Recently-touched tracker per entity.
    recent: BTreeMap<i64, RecentEdits>,

    /// Entities whose live diff was accepted (for reject bookkeeping).
    accepted_sync: HashSet<i64>,
}

/// The three catalog columns a live diff can stage.
pub const SYNC_FIELDS: [&str; 3] = ["price", "compare_at_price", "inventory_quantity"];

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a field edit, replacing any previous value for the same key.
    pub fn stage(&mut self, entity_id: i64, field: impl Into<String>, value: Value) {
        self.stage_at(entity_id, field, value, Utc::now());
    }

    /// Staging with an explicit timestamp; the window rule is tested
    /// through this entry point.
    pub fn stage_at(
        &mut self,
        entity_id: i64,
        field: impl Into<String>,
        value: Value,
        now: DateTime<Utc>,
    ) {
        let field = field.into();
        self.track_recent(entity_id, &field, now);
        self.edits.entry(entity_id).or_default().insert(field, value);
    }

    /// Returns the staged value for a key, if any.
    pub fn effective(&self, entity_id: i64, field: &str) -> Option<&Value> {
        self.edits.get(&entity_id)?.get(field)
    }

    /// Returns the staged value if present, else the fallback.
    pub fn effective_or<'a>(
        &'a self,
        entity_id: i64,
        field: &str,
        fallback: &'a Value,
    ) -> &'a Value {
        self.effective(entity_id, field).unwrap_or(fallback)
    }

    /// True when any edit is staged.
    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Merges an accepted live diff into the staged set.
    ///
    /// Accepted sync values ride the same commit as ordinary edits, so one
    /// persistence pass covers both. Money values stage as integer cents.
    pub fn accept_diff(&mut self, diff: &VariantDiff) {
        let now = Utc::now();
        if diff.price_changed {
            self.stage_at(
                diff.variant_id,
                "price",
                Value::from(diff.live_price.cents()),
                now,
            );
        }
        if diff.compare_at_changed {
            let value = match diff.live_compare_at {
                Some(m) => Value::from(m.cents()),
                None => Value::Null,
            };
            self.stage_at(diff.variant_id, "compare_at_price", value, now);
        }
        if diff.inventory_changed {
            self.stage_at(
                diff.variant_id,
                "inventory_quantity",
                Value::from(diff.live_inventory),
                now,
            );
        }
        self.accepted_sync.insert(diff.variant_id);
    }

    /// Drops a previously accepted diff from the staged set.
    ///
    /// Rejected diffs simply never reach storage; manual edits to other
    /// fields of the same entity are untouched.
    pub fn reject_diff(&mut self, variant_id: i64) {
        if !self.accepted_sync.remove(&variant_id) {
            return;
        }
        if let Some(fields) = self.edits.get_mut(&variant_id) {
            for field in SYNC_FIELDS {
                fields.remove(field);
            }
            if fields.is_empty() {
                self.edits.remove(&variant_id);
            }
        }
    }

    /// Fields recently touched for an entity, or empty when the trailing
    /// window has lapsed. Display heuristic only.
    pub fn recently_touched(&self, entity_id: i64, now: DateTime<Utc>) -> Vec<String> {
        let window = Duration::seconds(RECENT_EDIT_WINDOW_SECS);
        match self.recent.get(&entity_id) {
            Some(r) if now - r.last_modified_at <= window => {
                r.fields.iter().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Discards every staged edit without persisting anything.
    pub fn discard_all(&mut self) {
        self.edits.clear();
        self.recent.clear();
        self.accepted_sync.clear();
    }

    /// Drains the buffer into per-entity edit groups for persistence.
    ///
    /// Ordering is deterministic (ascending entity id) so commit reports
    /// are reproducible.
    pub fn commit(&mut self) -> Vec<EntityEdits> {
        let drained = std::mem::take(&mut self.edits);
        self.recent.clear();
        self.accepted_sync.clear();

        drained
            .into_iter()
            .map(|(entity_id, fields)| EntityEdits { entity_id, fields })
            .collect()
    }

    fn track_recent(&mut self, entity_id: i64, field: &str, now: DateTime<Utc>) {
        let window = Duration::seconds(RECENT_EDIT_WINDOW_SECS);
        let entry = self.recent.entry(entity_id).or_insert_with(|| RecentEdits {
            window_started_at: now,
            last_modified_at: now,
            fields: BTreeSet::new(),
        });

        // A new edit past the trailing window starts a fresh set; inside
        // the window, field names accumulate.
        if now - entry.window_started_at > window {
            entry.window_started_at = now;
            entry.fields.clear();
        }
        entry.last_modified_at = now;
        entry.fields.insert(field.to_string());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use serde_json::json;

    fn diff(variant_id: i64) -> VariantDiff {
        VariantDiff {
            variant_id,
            price_changed: true,
            compare_at_changed: false,
            inventory_changed: true,
            live_price: Money::from_cents(1100),
            live_compare_at: None,
            live_inventory: 3,
            previous_price: Money::from_cents(1000),
            previous_compare_at: None,
            previous_inventory: 5,
        }
    }

    #[test]
    fn test_last_write_wins_per_key() {
        let mut buf = EditBuffer::new();
        buf.stage(1, "cost_price", json!("5.00"));
        buf.stage(1, "cost_price", json!("6.00"));

        assert_eq!(buf.effective(1, "cost_price"), Some(&json!("6.00")));

        let committed = buf.commit();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].fields.len(), 1);
        assert_eq!(committed[0].fields["cost_price"], json!("6.00"));
    }

    #[test]
    fn test_effective_falls_back_when_unstaged() {
        let mut buf = EditBuffer::new();
        buf.stage(1, "supplier", json!("Acme"));

        let fallback = json!("Warehouse");
        assert_eq!(buf.effective_or(1, "supplier", &fallback), &json!("Acme"));
        assert_eq!(buf.effective_or(1, "notes", &fallback), &fallback);
        assert_eq!(buf.effective_or(2, "supplier", &fallback), &fallback);
    }

    #[test]
    fn test_commit_groups_by_entity_and_clears() {
        let mut buf = EditBuffer::new();
        buf.stage(2, "supplier", json!("Acme"));
        buf.stage(1, "cost_price", json!("6.00"));
        buf.stage(2, "notes", json!("fragile"));

        let committed = buf.commit();
        assert_eq!(committed.len(), 2);
        assert_eq!(committed[0].entity_id, 1);
        assert_eq!(committed[1].entity_id, 2);
        assert_eq!(committed[1].fields.len(), 2);

        assert!(!buf.is_dirty());
        assert!(buf.commit().is_empty());
    }

    #[test]
    fn test_discard_all_drops_everything() {
        let mut buf = EditBuffer::new();
        buf.stage(1, "notes", json!("x"));
        buf.accept_diff(&diff(2));

        buf.discard_all();
        assert!(!buf.is_dirty());
        assert_eq!(buf.effective(1, "notes"), None);
        assert_eq!(buf.effective(2, "price"), None);
    }

    #[test]
    fn test_accept_diff_stages_live_values() {
        let mut buf = EditBuffer::new();
        buf.accept_diff(&diff(7));

        assert_eq!(buf.effective(7, "price"), Some(&json!(1100)));
        assert_eq!(buf.effective(7, "inventory_quantity"), Some(&json!(3)));
        // compare_at unchanged → never staged
        assert_eq!(buf.effective(7, "compare_at_price"), None);
    }

    #[test]
    fn test_reject_diff_keeps_manual_edits() {
        let mut buf = EditBuffer::new();
        buf.stage(7, "cost_price", json!("4.00"));
        buf.accept_diff(&diff(7));
        buf.reject_diff(7);

        assert_eq!(buf.effective(7, "price"), None);
        assert_eq!(buf.effective(7, "inventory_quantity"), None);
        assert_eq!(buf.effective(7, "cost_price"), Some(&json!("4.00")));
    }

    #[test]
    fn test_reject_without_accept_is_a_noop() {
        let mut buf = EditBuffer::new();
        buf.stage(7, "price", json!(999));
        buf.reject_diff(7);
        // Manual price edit was not an accepted diff; it stays.
        assert_eq!(buf.effective(7, "price"), Some(&json!(999)));
    }

    #[test]
    fn test_recent_window_accumulates_then_resets() {
        // Heuristic display behavior, not a correctness guarantee.
        let mut buf = EditBuffer::new();
        let t0 = Utc::now();

        buf.stage_at(1, "cost_price", json!("6.00"), t0);
        buf.stage_at(1, "supplier", json!("Acme"), t0 + Duration::seconds(30));

        let touched = buf.recently_touched(1, t0 + Duration::seconds(40));
        assert_eq!(touched, vec!["cost_price".to_string(), "supplier".to_string()]);

        // Past the trailing window the set goes quiet...
        assert!(buf
            .recently_touched(1, t0 + Duration::seconds(200))
            .is_empty());

        // ...and a later edit starts a fresh window with only its own field.
        buf.stage_at(1, "notes", json!("n"), t0 + Duration::seconds(300));
        let touched = buf.recently_touched(1, t0 + Duration::seconds(301));
        assert_eq!(touched, vec!["notes".to_string()]);
    }
}
