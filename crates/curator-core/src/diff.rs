//! # Snapshot Differ
//!
//! Compares the stored catalog snapshot against a freshly fetched live
//! snapshot, field by field, with numeric-safe comparison.
//!
//! ## Diff Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Local vs Live Comparison                           │
//! │                                                                         │
//! │  local variant        live variant        result                       │
//! │  ─────────────        ─────────────       ──────                       │
//! │  price 12.00          price "12.0"        no diff (numeric equal)      │
//! │  inventory 5          inventory 3         inventory diff: 3 (was 5)    │
//! │  present              absent              UNKNOWN, never "removed"     │
//! │  absent               present             NEW variant, always changed  │
//! │                                                                         │
//! │  compare_at null and compare_at 0 stay distinct through coercion.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sync fetch may lag or paginate short, so absence on the live side is
//! treated as "no information", not a deletion. Removal is an operator
//! action, never inferred here.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hierarchy::build_hierarchy;
use crate::money::Money;
use crate::types::{ProductNode, Variant};

// =============================================================================
// Diff Types
// =============================================================================

/// A previous/live value pair for display ("3 (was 5)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedField<T> {
    pub previous: T,
    pub live: T,
}

impl<T: fmt::Display> fmt::Display for ChangedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (was {})", self.live, self.previous)
    }
}

/// Field-level diff for one variant present in both snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDiff {
    pub variant_id: i64,

    pub price_changed: bool,
    pub compare_at_changed: bool,
    pub inventory_changed: bool,

    /// Live replacement values (what a sync-accept would write).
    pub live_price: Money,
    pub live_compare_at: Option<Money>,
    pub live_inventory: i64,

    /// Original local values, retained for "previous" display.
    pub previous_price: Money,
    pub previous_compare_at: Option<Money>,
    pub previous_inventory: i64,
}

impl VariantDiff {
    /// True if any of the three tracked fields differ.
    #[inline]
    pub fn any_changed(&self) -> bool {
        self.price_changed || self.compare_at_changed || self.inventory_changed
    }

    /// The inventory pairing for display, when inventory changed.
    pub fn inventory_change(&self) -> Option<ChangedField<i64>> {
        self.inventory_changed.then_some(ChangedField {
            previous: self.previous_inventory,
            live: self.live_inventory,
        })
    }

    /// The price pairing for display, when price changed.
    pub fn price_change(&self) -> Option<ChangedField<Money>> {
        self.price_changed.then_some(ChangedField {
            previous: self.previous_price,
            live: self.live_price,
        })
    }
}

/// The full result of diffing a local snapshot against a live one.
///
/// `nodes` is ordered for presentation: new-product nodes first, then nodes
/// with at least one changed variant, then unchanged nodes. That ordering is
/// a presentation contract, not a storage contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Product nodes with live values applied and aggregates recomputed.
    pub nodes: Vec<ProductNode>,

    /// Per-variant diffs keyed by `variant_id` (changed variants only).
    pub diffs: HashMap<i64, VariantDiff>,

    /// Ids of live variants absent from the local store, each exactly once.
    pub new_variant_ids: Vec<i64>,
}

impl DiffReport {
    /// True if anything at all changed.
    pub fn has_changes(&self) -> bool {
        !self.diffs.is_empty() || !self.new_variant_ids.is_empty()
    }
}

// =============================================================================
// Differ
// =============================================================================

/// Diffs the stored snapshot against a live fetch.
///
/// Both sides are keyed by `variant_id`. Prices on both sides already went
/// through [`crate::money::coerce_money`] at their boundary, so comparison
/// here is exact integer-cents equality; `None` compare-at stays distinct
/// from zero.
pub fn diff_snapshots(local: &[Variant], live: &[Variant]) -> DiffReport {
    let live_by_id: HashMap<i64, &Variant> =
        live.iter().map(|v| (v.variant_id, v)).collect();
    let local_ids: HashSet<i64> = local.iter().map(|v| v.variant_id).collect();

    let mut diffs: HashMap<i64, VariantDiff> = HashMap::new();

    // Merge live values over the local snapshot. A local variant with no
    // live counterpart passes through untouched.
    let merged: Vec<Variant> = local
        .iter()
        .map(|stored| {
            let Some(fetched) = live_by_id.get(&stored.variant_id) else {
                return stored.clone();
            };

            let diff = compare_variant(stored, fetched);
            if !diff.any_changed() {
                return stored.clone();
            }

            let mut updated = stored.clone();
            if diff.price_changed {
                updated.price = diff.live_price;
            }
            if diff.compare_at_changed {
                updated.compare_at_price = diff.live_compare_at;
            }
            if diff.inventory_changed {
                updated.inventory_quantity = diff.live_inventory;
            }
            diffs.insert(stored.variant_id, diff);
            updated
        })
        .collect();

    let local_product_ids: HashSet<i64> = local.iter().map(|v| v.product_id).collect();

    let mut nodes = build_hierarchy(merged);
    for node in &mut nodes {
        node.has_changes = node
            .variants
            .iter()
            .any(|v| diffs.contains_key(&v.variant_id));
    }

    // Live-only variants: each one is reported exactly once. A variant
    // whose product already exists locally joins that product's node and
    // marks it changed; the rest form synthetic nodes flagged new.
    let (adopted, orphans): (Vec<Variant>, Vec<Variant>) = live
        .iter()
        .filter(|v| !local_ids.contains(&v.variant_id))
        .cloned()
        .partition(|v| local_product_ids.contains(&v.product_id));
    let new_variant_ids: Vec<i64> = adopted
        .iter()
        .chain(orphans.iter())
        .map(|v| v.variant_id)
        .collect();

    for variant in adopted {
        if let Some(node) = nodes.iter_mut().find(|n| n.product_id == variant.product_id) {
            node.variants.push(variant);
            node.rebuild_aggregates();
            node.has_changes = true;
        }
    }

    let mut new_nodes = build_hierarchy(orphans);
    for node in &mut new_nodes {
        node.is_new = true;
        node.has_changes = true;
    }

    // Presentation order: new, changed, unchanged.
    let (changed, unchanged): (Vec<_>, Vec<_>) =
        nodes.into_iter().partition(|n| n.has_changes);
    let mut ordered = new_nodes;
    ordered.extend(changed);
    ordered.extend(unchanged);

    DiffReport {
        nodes: ordered,
        diffs,
        new_variant_ids,
    }
}

/// Compares the three synced fields of one variant pair.
fn compare_variant(stored: &Variant, fetched: &Variant) -> VariantDiff {
    VariantDiff {
        variant_id: stored.variant_id,
        price_changed: stored.price != fetched.price,
        compare_at_changed: stored.compare_at_price != fetched.compare_at_price,
        inventory_changed: stored.inventory_quantity != fetched.inventory_quantity,
        live_price: fetched.price,
        live_compare_at: fetched.compare_at_price,
        live_inventory: fetched.inventory_quantity,
        previous_price: stored.price,
        previous_compare_at: stored.compare_at_price,
        previous_inventory: stored.inventory_quantity,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InternalMeta;

    fn variant(variant_id: i64, product_id: i64, price_cents: i64, inventory: i64) -> Variant {
        Variant {
            variant_id,
            product_id,
            title: format!("Item - V{variant_id}"),
            sku: format!("SKU-{variant_id}"),
            price: Money::from_cents(price_cents),
            compare_at_price: None,
            inventory_quantity: inventory,
            weight_grams: None,
            image_url: None,
            meta: InternalMeta::default(),
        }
    }

    #[test]
    fn test_numerically_equal_variants_report_no_diff() {
        // Local stored "12.00", live sent 12.0, both coerced to 1200 cents
        // at their boundaries, so the differ sees equality.
        let local = vec![variant(1, 1, 1200, 5)];
        let live = vec![variant(1, 1, 1200, 5)];

        let report = diff_snapshots(&local, &live);
        assert!(!report.has_changes());
        assert!(report.diffs.is_empty());
        assert!(!report.nodes[0].has_changes);
    }

    #[test]
    fn test_inventory_only_diff() {
        let local = vec![variant(1, 1, 1000, 5)];
        let live = vec![variant(1, 1, 1000, 3)];

        let report = diff_snapshots(&local, &live);
        let diff = &report.diffs[&1];
        assert!(diff.inventory_changed);
        assert!(!diff.price_changed);
        assert!(!diff.compare_at_changed);
        assert_eq!(diff.inventory_change().unwrap().to_string(), "3 (was 5)");

        // Product flagged changed, aggregate uses the live value.
        assert!(report.nodes[0].has_changes);
        assert_eq!(report.nodes[0].total_inventory, 3);
    }

    #[test]
    fn test_compare_at_null_vs_zero_is_a_diff() {
        let local = vec![variant(1, 1, 1000, 5)];
        let mut live_v = variant(1, 1, 1000, 5);
        live_v.compare_at_price = Some(Money::zero());
        let live = vec![live_v];

        let report = diff_snapshots(&local, &live);
        assert!(report.diffs[&1].compare_at_changed);
    }

    #[test]
    fn test_missing_live_counterpart_is_not_a_removal() {
        let local = vec![variant(1, 1, 1000, 5), variant(2, 1, 1200, 2)];
        let live = vec![variant(1, 1, 1000, 5)];

        let report = diff_snapshots(&local, &live);
        assert!(!report.has_changes());
        // Both local variants still present in the view.
        assert_eq!(report.nodes[0].variant_count, 2);
    }

    #[test]
    fn test_new_variants_bucket_first_and_marked_changed() {
        let local = vec![variant(1, 1, 1000, 5)];
        let live = vec![variant(1, 1, 1000, 5), variant(9, 9, 700, 4)];

        let report = diff_snapshots(&local, &live);
        assert_eq!(report.new_variant_ids, vec![9]);

        // New-product node ordered first, flagged new and changed.
        assert_eq!(report.nodes[0].product_id, 9);
        assert!(report.nodes[0].is_new);
        assert!(report.nodes[0].has_changes);

        // Appears exactly once across all nodes.
        let occurrences: usize = report
            .nodes
            .iter()
            .flat_map(|n| &n.variants)
            .filter(|v| v.variant_id == 9)
            .count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn test_new_variant_of_existing_product_joins_its_node() {
        let local = vec![variant(1, 1, 1000, 5)];
        let live = vec![variant(1, 1, 1000, 5), variant(2, 1, 1200, 3)];

        let report = diff_snapshots(&local, &live);
        assert_eq!(report.new_variant_ids, vec![2]);

        // The known product gains the variant; no second node appears.
        let product_nodes: Vec<_> =
            report.nodes.iter().filter(|n| n.product_id == 1).collect();
        assert_eq!(product_nodes.len(), 1);

        let node = product_nodes[0];
        assert!(!node.is_new);
        assert!(node.has_changes);
        assert_eq!(node.variant_count, 2);
        assert_eq!(node.total_inventory, 8);
    }

    #[test]
    fn test_presentation_order_new_changed_unchanged() {
        let local = vec![variant(1, 1, 1000, 5), variant(2, 2, 900, 1)];
        let live = vec![
            variant(2, 2, 950, 1),  // changed price
            variant(1, 1, 1000, 5), // unchanged
            variant(3, 3, 700, 2),  // new product
        ];

        let report = diff_snapshots(&local, &live);
        let order: Vec<i64> = report.nodes.iter().map(|n| n.product_id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_has_changes_iff_some_child_changed() {
        let local = vec![variant(1, 1, 1000, 5), variant(2, 1, 1200, 2)];
        let live = vec![variant(1, 1, 1000, 5), variant(2, 1, 1300, 2)];

        let report = diff_snapshots(&local, &live);
        assert!(report.nodes[0].has_changes);
        assert_eq!(report.diffs.len(), 1);

        let unchanged = diff_snapshots(&local, &local.clone());
        assert!(!unchanged.nodes[0].has_changes);
    }
}
