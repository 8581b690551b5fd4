//! # Variant Repository
//!
//! Database operations for the local catalog snapshot.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Variant Write Paths                                 │
//! │                                                                         │
//! │  SYNC UPSERT (accepted live values)                                    │
//! │  ──────────────────────────────────                                    │
//! │  INSERT .. ON CONFLICT(variant_id) DO UPDATE                           │
//! │  Catalog columns replaced, meta JSON UNTOUCHED on conflict:            │
//! │  platform sync must never clobber operator-owned fields.               │
//! │                                                                         │
//! │  META MERGE (staged operator edits)                                    │
//! │  ──────────────────────────────────                                    │
//! │  read meta → merge_field per staged key → write meta back              │
//! │  Partial update: untouched fields survive. Field-level                 │
//! │  last-write-wins within one commit call.                               │
//! │                                                                         │
//! │  CATALOG PATCH (accepted diffs on existing rows)                       │
//! │  ──────────────────────────────────────────────                        │
//! │  read row → apply FieldPatch → single row-scoped UPDATE                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use curator_core::{InternalMeta, Money, Variant};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `variants` table row; meta is a JSON blob column.
#[derive(Debug, FromRow)]
struct VariantRow {
    variant_id: i64,
    product_id: i64,
    title: String,
    sku: String,
    price_cents: i64,
    compare_at_cents: Option<i64>,
    inventory_quantity: i64,
    weight_grams: Option<f64>,
    image_url: Option<String>,
    meta: String,
}

impl VariantRow {
    fn into_variant(self) -> DbResult<Variant> {
        let meta: InternalMeta = serde_json::from_str(&self.meta)
            .map_err(|e| DbError::corrupt_blob("meta", self.variant_id, e))?;

        Ok(Variant {
            variant_id: self.variant_id,
            product_id: self.product_id,
            title: self.title,
            sku: self.sku,
            price: Money::from_cents(self.price_cents),
            compare_at_price: self.compare_at_cents.map(Money::from_cents),
            inventory_quantity: self.inventory_quantity,
            weight_grams: self.weight_grams,
            image_url: self.image_url,
            meta,
        })
    }
}

/// Selective catalog-column patch for one existing row.
///
/// `compare_at` is doubly optional: `None` = leave alone,
/// `Some(None)` = clear to NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub price: Option<Money>,
    pub compare_at: Option<Option<Money>>,
    pub inventory_quantity: Option<i64>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.compare_at.is_none() && self.inventory_quantity.is_none()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for variant database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.variants();
/// let all = repo.list_all().await?;
/// repo.upsert(&variant).await?;
/// ```
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    /// Creates a new VariantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    /// Gets a variant by its platform id.
    ///
    /// ## Returns
    /// * `Ok(Some(Variant))` - Variant found
    /// * `Ok(None)` - Variant not found
    pub async fn get(&self, variant_id: i64) -> DbResult<Option<Variant>> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT variant_id, product_id, title, sku, price_cents,
                   compare_at_cents, inventory_quantity, weight_grams,
                   image_url, meta
            FROM variants
            WHERE variant_id = ?1
            "#,
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VariantRow::into_variant).transpose()
    }

    /// Lists the whole stored snapshot, grouped-friendly order
    /// (product id, then variant id).
    pub async fn list_all(&self) -> DbResult<Vec<Variant>> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT variant_id, product_id, title, sku, price_cents,
                   compare_at_cents, inventory_quantity, weight_grams,
                   image_url, meta
            FROM variants
            ORDER BY product_id, variant_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VariantRow::into_variant).collect()
    }

    /// Upserts a variant keyed by `variant_id`.
    ///
    /// ## Conflict Behavior
    /// On conflict the catalog columns are replaced with the incoming
    /// values but the meta blob is left untouched: sync data never
    /// overwrites operator-owned fields. Inserts write the full row,
    /// meta included.
    pub async fn upsert(&self, variant: &Variant) -> DbResult<()> {
        debug!(variant_id = variant.variant_id, "Upserting variant");

        let meta = serde_json::to_string(&variant.meta)
            .map_err(|e| DbError::corrupt_blob("meta", variant.variant_id, e))?;
        let now = Utc::now();
        let compare_at = variant.compare_at_price.map(|m| m.cents());

        sqlx::query(
            r#"
            INSERT INTO variants (
                variant_id, product_id, title, sku, price_cents,
                compare_at_cents, inventory_quantity, weight_grams,
                image_url, meta, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            ON CONFLICT(variant_id) DO UPDATE SET
                product_id = excluded.product_id,
                title = excluded.title,
                sku = excluded.sku,
                price_cents = excluded.price_cents,
                compare_at_cents = excluded.compare_at_cents,
                inventory_quantity = excluded.inventory_quantity,
                weight_grams = excluded.weight_grams,
                image_url = excluded.image_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(variant.variant_id)
        .bind(variant.product_id)
        .bind(&variant.title)
        .bind(&variant.sku)
        .bind(variant.price.cents())
        .bind(compare_at)
        .bind(variant.inventory_quantity)
        .bind(variant.weight_grams)
        .bind(&variant.image_url)
        .bind(meta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Merges staged meta fields into an existing row.
    ///
    /// Read-modify-write of the meta JSON: only the named fields change,
    /// everything else in the blob survives.
    pub async fn merge_meta_fields(
        &self,
        variant_id: i64,
        fields: &BTreeMap<String, serde_json::Value>,
    ) -> DbResult<()> {
        debug!(variant_id, count = fields.len(), "Merging meta fields");

        let stored: Option<(String,)> =
            sqlx::query_as("SELECT meta FROM variants WHERE variant_id = ?1")
                .bind(variant_id)
                .fetch_optional(&self.pool)
                .await?;

        let raw = stored.ok_or_else(|| DbError::not_found("Variant", variant_id))?.0;
        let mut meta: InternalMeta = serde_json::from_str(&raw)
            .map_err(|e| DbError::corrupt_blob("meta", variant_id, e))?;

        for (field, value) in fields {
            meta.merge_field(field, value)
                .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        }

        let merged = serde_json::to_string(&meta)
            .map_err(|e| DbError::corrupt_blob("meta", variant_id, e))?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE variants SET meta = ?2, updated_at = ?3 WHERE variant_id = ?1",
        )
        .bind(variant_id)
        .bind(merged)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", variant_id));
        }

        Ok(())
    }

    /// Applies a selective catalog-column patch to an existing row.
    ///
    /// Row-scoped: read the current values, overlay the patch, write the
    /// three columns back in one UPDATE.
    pub async fn apply_field_patch(&self, variant_id: i64, patch: &FieldPatch) -> DbResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        debug!(variant_id, ?patch, "Applying catalog field patch");

        let current: Option<(i64, Option<i64>, i64)> = sqlx::query_as(
            "SELECT price_cents, compare_at_cents, inventory_quantity FROM variants WHERE variant_id = ?1",
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        let (mut price, mut compare_at, mut inventory) =
            current.ok_or_else(|| DbError::not_found("Variant", variant_id))?;

        if let Some(p) = patch.price {
            price = p.cents();
        }
        if let Some(c) = patch.compare_at {
            compare_at = c.map(|m| m.cents());
        }
        if let Some(q) = patch.inventory_quantity {
            inventory = q;
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET price_cents = ?2,
                compare_at_cents = ?3,
                inventory_quantity = ?4,
                updated_at = ?5
            WHERE variant_id = ?1
            "#,
        )
        .bind(variant_id)
        .bind(price)
        .bind(compare_at)
        .bind(inventory)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", variant_id));
        }

        Ok(())
    }

    /// Deletes a batch of operator-selected rows.
    ///
    /// ## Returns
    /// Number of rows actually removed (missing ids are not an error).
    pub async fn delete_many(&self, variant_ids: &[i64]) -> DbResult<u64> {
        debug!(count = variant_ids.len(), "Deleting variants");

        let mut deleted = 0u64;
        for id in variant_ids {
            let result = sqlx::query("DELETE FROM variants WHERE variant_id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            deleted += result.rows_affected();
        }

        Ok(deleted)
    }

    /// Counts stored variants (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM variants")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
