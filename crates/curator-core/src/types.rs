//! # Domain Types
//!
//! Core domain types used throughout Curator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Variant      │   │  ProductNode    │   │  ListingDraft   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  variant_id     │   │  product_id     │   │  id (UUID)      │       │
//! │  │  price          │   │  price_range    │   │  status         │       │
//! │  │  inventory      │   │  total_profit   │   │  data (blob)    │       │
//! │  │  meta (internal)│   │  variants[]     │   │  is_pushed      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Variant rows come from the platform; ProductNode (SPU) is DERIVED     │
//! │  by the hierarchy builder and never stored as its own row.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Source Identity
//! - `variant_id` / `product_id`: platform-assigned, stable, the only join key
//! - Draft ids: local UUID v4 until published; platform variant ids are never
//!   retrofit into a draft (only the top-level remote product id is)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{coerce_money, Money};

// =============================================================================
// Internal Metadata
// =============================================================================

/// Operator-owned fields that never leave the local store.
///
/// ## Open Map Semantics
/// The platform knows nothing about these fields. Known keys get typed
/// access; anything else survives round-trips through `extra` so an older
/// build never drops data written by a newer one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalMeta {
    /// Unit cost, used for total-cost and profit roll-ups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Money>,

    /// Supplier / vendor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Free-form operator notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Operator inventory override. When set, it is the authoritative
    /// displayed inventory until cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_inventory: Option<i64>,

    /// When the manual inventory was last touched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_updated_at: Option<DateTime<Utc>>,

    /// Unknown keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl InternalMeta {
    /// Applies a single staged field without touching the others.
    ///
    /// This is the field-level merge the committer relies on: a partial
    /// update, never a destructive overwrite of untouched fields.
    /// `"vendor"` is accepted as an alias for `"supplier"`.
    pub fn merge_field(&mut self, field: &str, value: &Value) -> CoreResult<()> {
        match field {
            "cost_price" => self.cost_price = coerce_money(Some(value))?,
            "supplier" | "vendor" => self.supplier = as_opt_string(value),
            "notes" => self.notes = as_opt_string(value),
            "manual_inventory" => {
                self.manual_inventory = match value {
                    Value::Null => None,
                    v => Some(v.as_i64().ok_or_else(|| CoreError::InvalidFieldValue {
                        field: "manual_inventory".to_string(),
                        reason: format!("expected an integer, got {v}"),
                    })?),
                };
                self.inventory_updated_at = Some(Utc::now());
            }
            "inventory_updated_at" => {
                self.inventory_updated_at = match value {
                    Value::Null => None,
                    Value::String(s) => Some(
                        DateTime::parse_from_rfc3339(s)
                            .map_err(|e| CoreError::InvalidFieldValue {
                                field: "inventory_updated_at".to_string(),
                                reason: format!("invalid timestamp: {e}"),
                            })?
                            .with_timezone(&Utc),
                    ),
                    v => {
                        return Err(CoreError::InvalidFieldValue {
                            field: "inventory_updated_at".to_string(),
                            reason: format!("expected an RFC 3339 string, got {v}"),
                        })
                    }
                };
            }
            other => {
                // Unknown keys land in the open map untyped.
                if value.is_null() {
                    self.extra.remove(other);
                } else {
                    self.extra.insert(other.to_string(), value.clone());
                }
            }
        }
        Ok(())
    }
}

fn as_opt_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Variant
// =============================================================================

/// A single purchasable unit (specific size/color/etc.) within an SPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Platform-assigned id, stable and globally unique across the catalog.
    pub variant_id: i64,

    /// Owning SPU id.
    pub product_id: i64,

    /// Combined title ("Product - Red / L").
    pub title: String,

    /// Stock Keeping Unit.
    pub sku: String,

    /// Current selling price.
    pub price: Money,

    /// Original price when on sale. `None` is distinct from zero.
    pub compare_at_price: Option<Money>,

    /// Platform-of-record inventory count.
    pub inventory_quantity: i64,

    /// Shipping weight in grams.
    pub weight_grams: Option<f64>,

    /// Resolved image URL (variant image, else product featured image).
    pub image_url: Option<String>,

    /// Internal-only fields (cost, supplier, manual override, …).
    #[serde(default)]
    pub meta: InternalMeta,
}

impl Variant {
    /// The inventory shown to the operator: manual override when set,
    /// otherwise the platform-reported count.
    #[inline]
    pub fn effective_inventory(&self) -> i64 {
        self.meta.manual_inventory.unwrap_or(self.inventory_quantity)
    }

    /// Per-variant profit (price − cost), `None` when no cost is recorded.
    #[inline]
    pub fn profit(&self) -> Option<Money> {
        self.meta.cost_price.map(|cost| self.price - cost)
    }
}

// =============================================================================
// Price Range
// =============================================================================

/// Min–max price range over a variant group.
///
/// Collapses to a single value when min == max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    /// Builds a range over an iterator of values. `None` for an empty set.
    pub fn over(values: impl IntoIterator<Item = Money>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let mut range = PriceRange { min: first, max: first };
        for v in iter {
            if v < range.min {
                range.min = v;
            }
            if v > range.max {
                range.max = v;
            }
        }
        Some(range)
    }

    /// True when the range holds a single value.
    #[inline]
    pub fn is_single(&self) -> bool {
        self.min == self.max
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

// =============================================================================
// Product Node (SPU)
// =============================================================================

/// The derived parent grouping that owns one or more variants.
///
/// ## Invariant
/// Aggregates are recomputed whenever any child variant's price, cost, or
/// inventory changes (see [`ProductNode::rebuild_aggregates`]); they are
/// never independently mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductNode {
    /// Platform product id.
    pub product_id: i64,

    /// Display title: first variant's title with the variant suffix stripped.
    pub title: String,

    /// Child variants, input order preserved.
    pub variants: Vec<Variant>,

    /// Number of child variants.
    pub variant_count: usize,

    /// Sum of each child's *effective* inventory.
    pub total_inventory: i64,

    /// Price range over children. `None` only for an empty group,
    /// which the hierarchy builder never produces.
    pub price_range: Option<PriceRange>,

    /// Compare-at range over children that carry one.
    pub compare_at_range: Option<PriceRange>,

    /// Sum of recorded cost prices.
    pub total_cost: Money,

    /// Sum of per-variant profit; variants without a cost are excluded.
    pub total_profit: Money,

    /// True iff any child has a diff, or the node owns a new variant.
    #[serde(default)]
    pub has_changes: bool,

    /// True when the whole product is absent from the local store.
    #[serde(default)]
    pub is_new: bool,
}

impl ProductNode {
    /// Recomputes every aggregate from the current variant set.
    pub fn rebuild_aggregates(&mut self) {
        self.variant_count = self.variants.len();
        self.total_inventory = self.variants.iter().map(Variant::effective_inventory).sum();
        self.price_range = PriceRange::over(self.variants.iter().map(|v| v.price));
        self.compare_at_range =
            PriceRange::over(self.variants.iter().filter_map(|v| v.compare_at_price));
        self.total_cost = self
            .variants
            .iter()
            .filter_map(|v| v.meta.cost_price)
            .fold(Money::zero(), |acc, c| acc + c);
        self.total_profit = self
            .variants
            .iter()
            .filter_map(Variant::profit)
            .fold(Money::zero(), |acc, p| acc + p);
    }
}

// =============================================================================
// Catalog Row
// =============================================================================

/// A single row in the UI-facing catalog tree.
///
/// One tagged discriminant instead of "is this a group row?" flags checked
/// at every render site; callers dispatch once at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogRow {
    /// An SPU group row.
    Product(ProductNode),
    /// A leaf variant row.
    Variant(Variant),
}

impl CatalogRow {
    /// The id used for selection and keying.
    pub fn entity_id(&self) -> i64 {
        match self {
            CatalogRow::Product(p) => p.product_id,
            CatalogRow::Variant(v) => v.variant_id,
        }
    }
}

// =============================================================================
// Listing Drafts
// =============================================================================

/// Lifecycle status of a listing draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Still being authored.
    #[default]
    Draft,
    /// Complete and eligible for publish.
    Ready,
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftStatus::Draft => write!(f, "draft"),
            DraftStatus::Ready => write!(f, "ready"),
        }
    }
}

/// An option axis on a draft (e.g. "Size" → ["S", "M", "L"]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A variant inside a draft, keyed by a locally generated id until publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftVariant {
    /// Local UUID; platform-assigned ids are never written back here.
    pub local_id: String,

    pub title: String,
    pub sku: Option<String>,
    pub price: Money,
    pub compare_at_price: Option<Money>,

    /// Unit cost, propagated to the platform after create.
    pub cost: Option<Money>,

    pub weight_grams: Option<f64>,

    /// Initial stock to set at the fulfillment location.
    pub inventory_quantity: Option<i64>,

    /// One value per option axis, in option order.
    #[serde(default)]
    pub option_values: Vec<String>,
}

impl DraftVariant {
    /// Creates an empty variant with a fresh local id.
    pub fn new(title: impl Into<String>, price: Money) -> Self {
        DraftVariant {
            local_id: Uuid::new_v4().to_string(),
            title: title.into(),
            sku: None,
            price,
            compare_at_price: None,
            cost: None,
            weight_grams: None,
            inventory_quantity: None,
            option_values: Vec::new(),
        }
    }
}

/// The opaque blob stored per draft.
///
/// The publish pipeline only ever rewrites `is_pushed` and
/// `remote_product_id`; every other field belongs to the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    /// Draft-level price, used when no explicit variants exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<f64>,

    #[serde(default)]
    pub options: Vec<DraftOption>,
    #[serde(default)]
    pub variants: Vec<DraftVariant>,

    /// Set once the create call has succeeded.
    #[serde(default)]
    pub is_pushed: bool,

    /// Remote numeric product id, parsed from the platform gid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_product_id: Option<i64>,
}

/// A staging row for a not-yet-published product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    /// Local UUID v4.
    pub id: String,

    pub status: DraftStatus,
    pub data: DraftData,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingDraft {
    /// Creates a fresh draft around the given data.
    pub fn new(data: DraftData) -> Self {
        let now = Utc::now();
        ListingDraft {
            id: Uuid::new_v4().to_string(),
            status: DraftStatus::Draft,
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
