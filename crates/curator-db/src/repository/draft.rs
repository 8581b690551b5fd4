//! # Listing Draft Repository
//!
//! Stores user-authored listing drafts as JSON blobs keyed by a local
//! uuid. The draft body never needs relational queries, so the whole
//! `DraftData` travels as one TEXT column; status lives beside it for
//! list filtering.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use curator_core::{DraftData, DraftStatus, ListingDraft};

#[derive(Debug, FromRow)]
struct DraftRow {
    id: String,
    status: DraftStatus,
    draft_data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DraftRow {
    fn into_draft(self) -> DbResult<ListingDraft> {
        let data: DraftData = serde_json::from_str(&self.draft_data)
            .map_err(|e| DbError::corrupt_blob("draft_data", &self.id, e))?;

        Ok(ListingDraft {
            id: self.id,
            status: self.status,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for listing draft operations.
#[derive(Debug, Clone)]
pub struct DraftRepository {
    pool: SqlitePool,
}

impl DraftRepository {
    /// Creates a new DraftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DraftRepository { pool }
    }

    /// Inserts a new draft.
    pub async fn insert(&self, draft: &ListingDraft) -> DbResult<()> {
        debug!(draft_id = %draft.id, "Inserting listing draft");

        let blob = serde_json::to_string(&draft.data)
            .map_err(|e| DbError::corrupt_blob("draft_data", &draft.id, e))?;

        sqlx::query(
            r#"
            INSERT INTO listing_drafts (id, status, draft_data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&draft.id)
        .bind(draft.status)
        .bind(blob)
        .bind(draft.created_at)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a draft by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<ListingDraft>> {
        let row = sqlx::query_as::<_, DraftRow>(
            "SELECT id, status, draft_data, created_at, updated_at FROM listing_drafts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DraftRow::into_draft).transpose()
    }

    /// Lists all drafts, newest first.
    pub async fn list(&self) -> DbResult<Vec<ListingDraft>> {
        let rows = sqlx::query_as::<_, DraftRow>(
            "SELECT id, status, draft_data, created_at, updated_at FROM listing_drafts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DraftRow::into_draft).collect()
    }

    /// Replaces the draft body wholesale.
    pub async fn update_data(&self, id: &str, data: &DraftData) -> DbResult<()> {
        debug!(draft_id = %id, "Updating draft data");

        let blob = serde_json::to_string(data)
            .map_err(|e| DbError::corrupt_blob("draft_data", id, e))?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE listing_drafts SET draft_data = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(blob)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ListingDraft", id));
        }

        Ok(())
    }

    /// Sets the workflow status.
    pub async fn set_status(&self, id: &str, status: DraftStatus) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE listing_drafts SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ListingDraft", id));
        }

        Ok(())
    }

    /// Marks a draft as pushed to the platform.
    ///
    /// Rewrites only `is_pushed` and `remote_product_id` inside the blob;
    /// the rest of the draft body is read back and preserved verbatim.
    pub async fn mark_pushed(&self, id: &str, remote_product_id: i64) -> DbResult<()> {
        let draft = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("ListingDraft", id))?;

        if draft.data.is_pushed {
            warn!(draft_id = %id, "Draft already marked pushed, overwriting remote id");
        }

        let mut data = draft.data;
        data.is_pushed = true;
        data.remote_product_id = Some(remote_product_id);

        self.update_data(id, &data).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use curator_core::{DraftVariant, Money};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_draft() -> ListingDraft {
        let data = DraftData {
            title: "Walnut Desk Organizer".to_string(),
            vendor: Some("Acme".to_string()),
            variants: vec![DraftVariant::new("Small", Money::from_cents(2500))],
            ..DraftData::default()
        };
        ListingDraft::new(data)
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let db = test_db().await;
        let repo = db.drafts();

        let draft = sample_draft();
        repo.insert(&draft).await.unwrap();

        let stored = repo.get(&draft.id).await.unwrap().unwrap();
        assert_eq!(stored.data.title, "Walnut Desk Organizer");
        assert_eq!(stored.status, DraftStatus::Draft);
        assert_eq!(stored.data.variants.len(), 1);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_data_replaces_body() {
        let db = test_db().await;
        let repo = db.drafts();

        let draft = sample_draft();
        repo.insert(&draft).await.unwrap();

        let mut data = draft.data.clone();
        data.title = "Renamed".to_string();
        repo.update_data(&draft.id, &data).await.unwrap();

        let stored = repo.get(&draft.id).await.unwrap().unwrap();
        assert_eq!(stored.data.title, "Renamed");
    }

    #[tokio::test]
    async fn test_mark_pushed_touches_only_push_fields() {
        let db = test_db().await;
        let repo = db.drafts();

        let draft = sample_draft();
        repo.insert(&draft).await.unwrap();

        repo.mark_pushed(&draft.id, 9001).await.unwrap();

        let stored = repo.get(&draft.id).await.unwrap().unwrap();
        assert!(stored.data.is_pushed);
        assert_eq!(stored.data.remote_product_id, Some(9001));
        // Body untouched.
        assert_eq!(stored.data.title, "Walnut Desk Organizer");
        assert_eq!(stored.data.vendor.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_set_status_missing_draft() {
        let db = test_db().await;
        let repo = db.drafts();

        let err = repo.set_status("nope", DraftStatus::Ready).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
