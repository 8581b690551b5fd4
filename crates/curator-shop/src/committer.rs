//! # Reconciliation Committer
//!
//! Persists a staged-edit set with per-entity failure isolation.
//!
//! ## Commit Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Commit Phases                                   │
//! │                                                                         │
//! │  1. DELETIONS (own batch, first)                                       │
//! │     A row marked both "deleted" and "changed by sync" must end up      │
//! │     deleted, never resurrected by a later upsert.                      │
//! │                                                                         │
//! │  2. STAGED EDITS (bounded parallel chunks)                             │
//! │     Catalog fields → row-scoped column patch                           │
//! │     Everything else → partial meta merge                               │
//! │                                                                         │
//! │  3. SYNC UPSERTS (bounded parallel chunks)                             │
//! │     Accepted new variants inserted; existing rows refreshed with       │
//! │     meta left untouched.                                               │
//! │                                                                         │
//! │  One entity failing never aborts the rest; the report carries          │
//! │  each failure by id and reason.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::batch::run_chunked;
use crate::error::ShopResult;
use curator_core::stage::SYNC_FIELDS;
use curator_core::{EntityEdits, Money, Variant};
use curator_db::{Database, FieldPatch};

/// Everything one commit call persists.
#[derive(Debug, Default)]
pub struct CommitPlan {
    /// Operator-selected variant rows to remove.
    pub deletions: Vec<i64>,
    /// Staged field edits grouped by entity, from the edit buffer.
    pub edits: Vec<EntityEdits>,
    /// Accepted live variants to upsert (new and changed).
    pub sync_upserts: Vec<Variant>,
}

impl CommitPlan {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.edits.is_empty() && self.sync_upserts.is_empty()
    }
}

/// One entity that failed to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub entity_id: i64,
    pub reason: String,
}

/// Aggregate per-entity outcome of a commit.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub deleted: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, result: Result<(), CommitFailure>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(failure) => {
                warn!(entity_id = failure.entity_id, reason = %failure.reason, "Entity commit failed");
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }
}

/// Applies commit plans against the database.
#[derive(Debug, Clone)]
pub struct ReconciliationCommitter {
    db: Database,
    chunk_size: usize,
}

impl ReconciliationCommitter {
    pub fn new(db: Database, chunk_size: usize) -> Self {
        ReconciliationCommitter { db, chunk_size }
    }

    /// Persists the plan and reports per-entity outcomes.
    ///
    /// Only a failure of the deletion batch itself aborts the call;
    /// edit and upsert failures are isolated per entity.
    pub async fn commit(&self, plan: CommitPlan) -> ShopResult<CommitReport> {
        let mut report = CommitReport::default();

        let deleted_ids: HashSet<i64> = plan.deletions.iter().copied().collect();
        if !plan.deletions.is_empty() {
            report.deleted = self.db.variants().delete_many(&plan.deletions).await?;
        }

        // Deletions win: a row in both the deletion set and a later
        // phase stays deleted, so its edits and upserts are dropped.
        let edits: Vec<EntityEdits> = plan
            .edits
            .into_iter()
            .filter(|edit| !deleted_ids.contains(&edit.entity_id))
            .collect();
        let sync_upserts: Vec<Variant> = plan
            .sync_upserts
            .into_iter()
            .filter(|variant| !deleted_ids.contains(&variant.variant_id))
            .collect();

        let repo = self.db.variants();
        let edit_results = run_chunked(edits, self.chunk_size, |edit| {
            let repo = repo.clone();
            async move {
                apply_entity_edit(&repo, &edit)
                    .await
                    .map_err(|reason| CommitFailure {
                        entity_id: edit.entity_id,
                        reason,
                    })
            }
        })
        .await;
        for result in edit_results {
            report.record(result);
        }

        let upsert_results = run_chunked(sync_upserts, self.chunk_size, |variant| {
            let repo = repo.clone();
            async move {
                let entity_id = variant.variant_id;
                repo.upsert(&variant).await.map_err(|e| CommitFailure {
                    entity_id,
                    reason: e.to_string(),
                })
            }
        })
        .await;
        for result in upsert_results {
            report.record(result);
        }

        info!(
            deleted = report.deleted,
            succeeded = report.succeeded,
            failed = report.failed,
            "Commit finished"
        );
        Ok(report)
    }
}

/// Persists one entity's staged fields.
///
/// Catalog columns get a row-scoped patch; every other field merges
/// into the meta blob. Both writes are partial, untouched fields
/// survive.
async fn apply_entity_edit(
    repo: &curator_db::VariantRepository,
    edit: &EntityEdits,
) -> Result<(), String> {
    let (patch, meta_fields) = split_fields(&edit.fields)?;

    if !patch.is_empty() {
        repo.apply_field_patch(edit.entity_id, &patch)
            .await
            .map_err(|e| e.to_string())?;
    }
    if !meta_fields.is_empty() {
        repo.merge_meta_fields(edit.entity_id, &meta_fields)
            .await
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Routes staged fields to the catalog patch or the meta merge.
fn split_fields(
    fields: &BTreeMap<String, Value>,
) -> Result<(FieldPatch, BTreeMap<String, Value>), String> {
    let mut patch = FieldPatch::default();
    let mut meta_fields = BTreeMap::new();

    for (field, value) in fields {
        if !SYNC_FIELDS.contains(&field.as_str()) {
            meta_fields.insert(field.clone(), value.clone());
            continue;
        }
        match field.as_str() {
            "price" => {
                patch.price = Some(
                    staged_money(value)?
                        .ok_or_else(|| "price cannot be cleared".to_string())?,
                );
            }
            "compare_at_price" => {
                patch.compare_at = Some(staged_money(value)?);
            }
            "inventory_quantity" => {
                let quantity = value
                    .as_i64()
                    .ok_or_else(|| format!("inventory_quantity is not an integer: {value}"))?;
                patch.inventory_quantity = Some(quantity);
            }
            _ => unreachable!(),
        }
    }

    Ok((patch, meta_fields))
}

/// Decodes a staged money value.
///
/// Integers are cents (accepted diffs stage live values that way),
/// strings are decimal currency (operator input), null clears.
fn staged_money(value: &Value) -> Result<Option<Money>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(|cents| Some(Money::from_cents(cents)))
            .ok_or_else(|| format!("money value is not integer cents: {n}")),
        Value::String(s) => Money::parse(s).map(Some).map_err(|e| e.to_string()),
        other => Err(format!("unsupported money value: {other}")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::{EditBuffer, InternalMeta};
    use curator_db::DbConfig;
    use serde_json::json;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn variant(variant_id: i64, product_id: i64, price_cents: i64) -> Variant {
        Variant {
            variant_id,
            product_id,
            title: format!("Item - V{variant_id}"),
            sku: String::new(),
            price: Money::from_cents(price_cents),
            compare_at_price: None,
            inventory_quantity: 5,
            weight_grams: None,
            image_url: None,
            meta: InternalMeta::default(),
        }
    }

    #[tokio::test]
    async fn test_commit_persists_edits_and_upserts() {
        let db = test_db().await;
        db.variants().upsert(&variant(1, 10, 1000)).await.unwrap();
        let committer = ReconciliationCommitter::new(db.clone(), 4);

        let mut buffer = EditBuffer::new();
        buffer.stage(1, "cost_price", json!("4.50"));
        buffer.stage(1, "price", json!("11.00"));

        let plan = CommitPlan {
            deletions: vec![],
            edits: buffer.commit(),
            sync_upserts: vec![variant(2, 10, 2000)],
        };
        let report = committer.commit(plan).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.succeeded, 2);

        let stored = db.variants().get(1).await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(1100));
        assert_eq!(stored.meta.cost_price, Some(Money::from_cents(450)));
        assert!(db.variants().get(2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_the_rest() {
        let db = test_db().await;
        db.variants().upsert(&variant(1, 10, 1000)).await.unwrap();
        db.variants().upsert(&variant(3, 10, 1000)).await.unwrap();
        let committer = ReconciliationCommitter::new(db.clone(), 4);

        let mut buffer = EditBuffer::new();
        buffer.stage(1, "notes", json!("ok"));
        buffer.stage(2, "notes", json!("missing row"));
        buffer.stage(3, "notes", json!("also ok"));

        let report = committer
            .commit(CommitPlan {
                edits: buffer.commit(),
                ..CommitPlan::default()
            })
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].entity_id, 2);
        assert!(report.failures[0].reason.contains("not found"));

        let stored = db.variants().get(3).await.unwrap().unwrap();
        assert_eq!(stored.meta.notes.as_deref(), Some("also ok"));
    }

    #[tokio::test]
    async fn test_deletion_wins_over_sync_upsert() {
        let db = test_db().await;
        db.variants().upsert(&variant(1, 10, 1000)).await.unwrap();
        let committer = ReconciliationCommitter::new(db.clone(), 4);

        // Same row deleted and refreshed by sync in one plan: the
        // deletion wins and the upsert for that id is dropped, so the
        // row stays gone. An unrelated upsert still lands.
        let mut edits = EditBuffer::new();
        edits.stage(1, "notes", json!("edit on a deleted row"));
        let report = committer
            .commit(CommitPlan {
                deletions: vec![1],
                edits: edits.commit(),
                sync_upserts: vec![variant(1, 10, 1200), variant(2, 10, 900)],
            })
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        assert!(db.variants().get(1).await.unwrap().is_none());
        assert!(db.variants().get(2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_accepted_diff_values_round_trip_as_cents() {
        let db = test_db().await;
        db.variants().upsert(&variant(1, 10, 1000)).await.unwrap();
        let committer = ReconciliationCommitter::new(db.clone(), 4);

        // Accepted diffs stage integer cents.
        let mut buffer = EditBuffer::new();
        buffer.stage(1, "price", json!(1250));
        buffer.stage(1, "compare_at_price", Value::Null);
        buffer.stage(1, "inventory_quantity", json!(3));

        let report = committer
            .commit(CommitPlan {
                edits: buffer.commit(),
                ..CommitPlan::default()
            })
            .await
            .unwrap();
        assert!(report.is_clean());

        let stored = db.variants().get(1).await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(1250));
        assert_eq!(stored.compare_at_price, None);
        assert_eq!(stored.inventory_quantity, 3);
    }

    #[test]
    fn test_split_fields_routes_by_name() {
        let mut fields = BTreeMap::new();
        fields.insert("price".to_string(), json!("9.99"));
        fields.insert("supplier".to_string(), json!("Acme"));
        fields.insert("manual_inventory".to_string(), json!(7));

        let (patch, meta) = split_fields(&fields).unwrap();
        assert_eq!(patch.price, Some(Money::from_cents(999)));
        assert!(meta.contains_key("supplier"));
        assert!(meta.contains_key("manual_inventory"));
        assert!(!meta.contains_key("price"));
    }
}
