//! # Hierarchy Builder
//!
//! Groups a flat list of variants into the two-level SPU/variant tree.
//!
//! ## How Grouping Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Flat Rows → Product Nodes                             │
//! │                                                                         │
//! │  Input (platform order preserved):                                     │
//! │    {variant 11, product 1, "Tee - S"}                                  │
//! │    {variant 12, product 1, "Tee - M"}                                  │
//! │    {variant 21, product 2, "Mug"}                                      │
//! │                                                                         │
//! │  Output:                                                               │
//! │    ProductNode 1 "Tee"  → [11, 12]   ranges/totals recomputed          │
//! │    ProductNode 2 "Mug"  → [21]                                         │
//! │                                                                         │
//! │  First-seen order for groups, input order inside each group.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This operation is pure and idempotent: re-running it on the same input
//! yields identical output. No hidden counters, no generated ids.

use std::collections::HashMap;

use crate::money::Money;
use crate::types::{ProductNode, Variant};

/// Builds SPU nodes from an unordered sequence of variant rows.
///
/// Grouping key is `product_id`; a variant with no group yet creates one,
/// seeded with a display title derived from the first variant's combined
/// title. Aggregates (ranges, totals, effective inventory) are computed
/// per group via [`ProductNode::rebuild_aggregates`].
pub fn build_hierarchy(variants: impl IntoIterator<Item = Variant>) -> Vec<ProductNode> {
    let mut nodes: Vec<ProductNode> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for variant in variants {
        let slot = match index.get(&variant.product_id) {
            Some(&i) => i,
            None => {
                let node = ProductNode {
                    product_id: variant.product_id,
                    title: display_title(&variant.title),
                    variants: Vec::new(),
                    variant_count: 0,
                    total_inventory: 0,
                    price_range: None,
                    compare_at_range: None,
                    total_cost: Money::zero(),
                    total_profit: Money::zero(),
                    has_changes: false,
                    is_new: false,
                };
                nodes.push(node);
                index.insert(variant.product_id, nodes.len() - 1);
                nodes.len() - 1
            }
        };
        nodes[slot].variants.push(variant);
    }

    for node in &mut nodes {
        node.rebuild_aggregates();
    }

    nodes
}

/// Strips the variant suffix from a combined title.
///
/// The platform renders variant titles as `"<product> - <option values>"`;
/// the SPU row shows only the product part. A title with no separator is
/// used as-is (single-variant products).
pub fn display_title(combined: &str) -> String {
    match combined.split_once(" - ") {
        Some((product, _suffix)) => product.to_string(),
        None => combined.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
