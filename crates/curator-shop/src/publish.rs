//! # Publish Pipeline
//!
//! Turns a listing draft into a remote product through a sequence of
//! dependent platform calls.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Publish States                                    │
//! │                                                                         │
//! │  Draft ──► Creating ──► Created ──► CostSyncing ──►                    │
//! │              │                         InventoryLocating ──►           │
//! │              │                            InventorySetting ──►         │
//! │              ▼                               Published                  │
//! │         create fails:                                                  │
//! │         hard error, no                 Errors after Created are        │
//! │         side effects,                  recorded per step and the       │
//! │         draft untouched                draft is marked pushed anyway:  │
//! │                                        the remote product exists and   │
//! │                                        must not be silently orphaned.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps after create never run in parallel with each other: each one
//! depends on identifiers returned by the previous call.

use tracing::{debug, info, warn};

use crate::client::{
    CreateProductRequest, CreatedVariant, InventoryQuantity, NewOption, NewVariant, SetInventoryRequest,
    ShopClient, parse_gid,
};
use crate::error::{ShopError, ShopResult};
use curator_core::validation::validate_draft_for_publish;
use curator_core::{CoreError, DraftData, Money};
use curator_db::Database;

/// Audit reason sent with absolute inventory corrections.
const INVENTORY_REASON: &str = "correction";

/// How many locations to ask for when picking the fulfillment site.
const LOCATION_LOOKUP_LIMIT: u32 = 10;

// =============================================================================
// States and Outcome
// =============================================================================

/// Progress of one publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Draft,
    Creating,
    Created,
    CostSyncing,
    InventoryLocating,
    InventorySetting,
    Published,
}

impl std::fmt::Display for PublishState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishState::Draft => "draft",
            PublishState::Creating => "creating",
            PublishState::Created => "created",
            PublishState::CostSyncing => "cost_syncing",
            PublishState::InventoryLocating => "inventory_locating",
            PublishState::InventorySetting => "inventory_setting",
            PublishState::Published => "published",
        };
        write!(f, "{name}")
    }
}

/// The step a soft failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Create,
    CostSync,
    LocationLookup,
    InventorySet,
    MarkPushed,
}

/// One recorded, non-fatal step failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub step: PublishStep,
    pub message: String,
}

/// Result of a publish that reached `Created`.
///
/// `step_errors` holds everything that went wrong after the product
/// existed; the publish still counts as successful.
#[derive(Debug)]
pub struct PublishOutcome {
    pub state: PublishState,
    pub remote_product_id: i64,
    pub remote_gid: String,
    pub step_errors: Vec<StepError>,
}

impl PublishOutcome {
    pub fn is_clean(&self) -> bool {
        self.step_errors.is_empty()
    }
}

/// Per-variant follow-up work, aligned by index with the create
/// request's variant order.
#[derive(Debug, Clone, PartialEq)]
struct PlannedVariant {
    cost: Option<Money>,
    quantity: Option<i64>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Executes the draft-to-remote-product sequence.
///
/// Client and database are injected once at construction so tests can
/// run the full pipeline against a fake platform.
#[derive(Debug)]
pub struct PublishPipeline<C: ShopClient> {
    db: Database,
    client: C,
}

impl<C: ShopClient> PublishPipeline<C> {
    pub fn new(db: Database, client: C) -> Self {
        PublishPipeline { db, client }
    }

    /// Publishes one draft.
    ///
    /// Fails hard (no side effects, draft untouched) on local validation
    /// errors and on a rejected create call. Once the create succeeds,
    /// every later failure is recorded in the outcome instead.
    ///
    /// Re-publishing an already-pushed draft is not guarded against and
    /// creates a duplicate remote product; callers get a warning log.
    pub async fn publish(&self, draft_id: &str) -> ShopResult<PublishOutcome> {
        let mut state = PublishState::Draft;
        let draft = self
            .db
            .drafts()
            .get(draft_id)
            .await?
            .ok_or_else(|| CoreError::DraftNotFound(draft_id.to_string()))?;
        debug!(draft_id, %state, title = %draft.data.title, "Loaded draft");

        if draft.data.is_pushed {
            warn!(draft_id, remote = ?draft.data.remote_product_id,
                "Draft already pushed, publishing again will duplicate the remote product");
        }

        // Local validation rejects before any network call.
        validate_draft_for_publish(&draft.data).map_err(CoreError::from)?;

        let (request, planned) = build_create_request(&draft.data);
        state = PublishState::Creating;
        debug!(draft_id, %state, variants = request.variants.len(), "Creating remote product");

        let created = self.client.create_product(&request).await?;
        state = PublishState::Created;
        info!(draft_id, %state, remote_gid = %created.admin_graphql_api_id, "Remote product created");

        let mut step_errors = Vec::new();
        let aligned = created.variants.len() == planned.len();
        if !aligned {
            step_errors.push(StepError {
                step: PublishStep::Create,
                message: ShopError::VariantCountMismatch {
                    sent: planned.len(),
                    returned: created.variants.len(),
                }
                .to_string(),
            });
            warn!(draft_id, "Variant count mismatch, skipping cost and inventory steps");
        }

        if aligned {
            state = PublishState::CostSyncing;
            self.sync_costs(&planned, &created.variants, &mut step_errors)
                .await;

            self.set_inventory(&mut state, &planned, &created.variants, &mut step_errors)
                .await;
        }

        // Best effort: the remote product exists either way.
        let remote_product_id = match parse_gid(&created.admin_graphql_api_id) {
            Ok(id) => id,
            Err(e) => {
                step_errors.push(StepError {
                    step: PublishStep::MarkPushed,
                    message: e.to_string(),
                });
                created.id
            }
        };
        if let Err(e) = self.db.drafts().mark_pushed(draft_id, remote_product_id).await {
            warn!(draft_id, error = %e, "Failed to mark draft pushed");
            step_errors.push(StepError {
                step: PublishStep::MarkPushed,
                message: e.to_string(),
            });
        }

        state = PublishState::Published;
        info!(draft_id, %state, remote_product_id, errors = step_errors.len(), "Publish finished");

        Ok(PublishOutcome {
            state,
            remote_product_id,
            remote_gid: created.admin_graphql_api_id,
            step_errors,
        })
    }

    /// Step 3: one cost call per variant that declared a cost, failures
    /// isolated per variant.
    async fn sync_costs(
        &self,
        planned: &[PlannedVariant],
        created: &[CreatedVariant],
        step_errors: &mut Vec<StepError>,
    ) {
        for (plan, remote) in planned.iter().zip(created) {
            let Some(cost) = plan.cost else { continue };

            let Some(inventory_item_id) = remote.inventory_item_id else {
                step_errors.push(StepError {
                    step: PublishStep::CostSync,
                    message: ShopError::MissingInventoryItem {
                        variant_id: remote.id,
                    }
                    .to_string(),
                });
                continue;
            };

            if let Err(e) = self.client.update_variant_cost(inventory_item_id, cost).await {
                warn!(variant_id = remote.id, error = %e, "Cost update failed");
                step_errors.push(StepError {
                    step: PublishStep::CostSync,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Steps 4 and 5: locate the fulfillment site, then batch one
    /// absolute on-hand correction. Both are skipped, not fatal, when
    /// no quantity was declared or no location exists.
    async fn set_inventory(
        &self,
        state: &mut PublishState,
        planned: &[PlannedVariant],
        created: &[CreatedVariant],
        step_errors: &mut Vec<StepError>,
    ) {
        let declared: Vec<(i64, i64)> = planned
            .iter()
            .zip(created)
            .filter_map(|(plan, remote)| {
                let quantity = plan.quantity?;
                let item_id = remote.inventory_item_id?;
                Some((item_id, quantity))
            })
            .collect();
        if declared.is_empty() {
            return;
        }

        *state = PublishState::InventoryLocating;
        let location = match self
            .client
            .list_locations(LOCATION_LOOKUP_LIMIT, true)
            .await
        {
            Ok(locations) => locations.into_iter().next(),
            Err(e) => {
                step_errors.push(StepError {
                    step: PublishStep::LocationLookup,
                    message: e.to_string(),
                });
                return;
            }
        };
        let Some(location) = location else {
            warn!("No active location, skipping inventory propagation");
            step_errors.push(StepError {
                step: PublishStep::LocationLookup,
                message: ShopError::MissingLocation.to_string(),
            });
            return;
        };

        *state = PublishState::InventorySetting;
        let request = SetInventoryRequest {
            reason: INVENTORY_REASON.to_string(),
            ignore_discrepancy: true,
            quantities: declared
                .into_iter()
                .map(|(inventory_item_id, quantity)| InventoryQuantity {
                    inventory_item_id,
                    location_id: location.id,
                    quantity,
                })
                .collect(),
        };
        if let Err(e) = self.client.set_inventory_quantities(&request).await {
            warn!(error = %e, "Inventory set failed");
            step_errors.push(StepError {
                step: PublishStep::InventorySet,
                message: e.to_string(),
            });
        }
    }
}

// =============================================================================
// Request Building
// =============================================================================

/// Maps a draft into the platform's nested create shape, plus the
/// per-variant follow-up plan in the same order.
///
/// A draft with zero explicit variants synthesizes the platform's own
/// single-variant convention: one "Title" option with the single value
/// "Default Title".
fn build_create_request(data: &DraftData) -> (CreateProductRequest, Vec<PlannedVariant>) {
    if data.variants.is_empty() {
        let request = CreateProductRequest {
            title: data.title.clone(),
            body_html: data.description.clone(),
            vendor: data.vendor.clone(),
            product_type: data.product_type.clone(),
            status: "active".to_string(),
            options: vec![NewOption {
                name: "Title".to_string(),
                values: vec!["Default Title".to_string()],
            }],
            variants: vec![NewVariant {
                price: data.price.unwrap_or(Money::zero()).to_decimal_string(),
                sku: None,
                grams: data.weight_grams.map(|g| g.round() as i64),
                compare_at_price: data.compare_at_price.map(|m| m.to_decimal_string()),
                option1: Some("Default Title".to_string()),
                option2: None,
                option3: None,
            }],
        };
        let planned = vec![PlannedVariant {
            cost: data.cost,
            quantity: None,
        }];
        return (request, planned);
    }

    let options = data
        .options
        .iter()
        .map(|o| NewOption {
            name: o.name.clone(),
            values: o.values.clone(),
        })
        .collect();

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut planned = Vec::with_capacity(data.variants.len());
    for draft_variant in &data.variants {
        let mut values = draft_variant.option_values.iter().cloned();
        variants.push(NewVariant {
            price: draft_variant.price.to_decimal_string(),
            sku: draft_variant.sku.clone(),
            grams: draft_variant
                .weight_grams
                .or(data.weight_grams)
                .map(|g| g.round() as i64),
            compare_at_price: draft_variant
                .compare_at_price
                .or(data.compare_at_price)
                .map(|m| m.to_decimal_string()),
            option1: values.next(),
            option2: values.next(),
            option3: values.next(),
        });
        planned.push(PlannedVariant {
            cost: draft_variant.cost.or(data.cost),
            quantity: draft_variant.inventory_quantity,
        });
    }

    (
        CreateProductRequest {
            title: data.title.clone(),
            body_html: data.description.clone(),
            vendor: data.vendor.clone(),
            product_type: data.product_type.clone(),
            status: "active".to_string(),
            options,
            variants,
        },
        planned,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CreatedProduct, Location};
    use crate::error::UserError;
    use crate::testing::FakeShopClient;
    use curator_core::{DraftOption, DraftVariant, ListingDraft};
    use curator_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn draft_with_variants(costs: &[Option<i64>], quantities: &[Option<i64>]) -> ListingDraft {
        let variants = costs
            .iter()
            .zip(quantities)
            .enumerate()
            .map(|(i, (cost, quantity))| {
                let mut v = DraftVariant::new(format!("V{i}"), Money::from_cents(1000));
                v.cost = cost.map(Money::from_cents);
                v.inventory_quantity = *quantity;
                v.option_values = vec![format!("Size {i}")];
                v
            })
            .collect();

        ListingDraft::new(DraftData {
            title: "Canvas Tote".to_string(),
            options: vec![DraftOption {
                name: "Size".to_string(),
                values: costs.iter().enumerate().map(|(i, _)| format!("Size {i}")).collect(),
            }],
            variants,
            ..DraftData::default()
        })
    }

    fn created(gid: &str, variant_count: usize) -> CreatedProduct {
        CreatedProduct {
            id: 777,
            admin_graphql_api_id: gid.to_string(),
            status: "active".to_string(),
            variants: (0..variant_count)
                .map(|i| CreatedVariant {
                    id: 100 + i as i64,
                    inventory_item_id: Some(500 + i as i64),
                })
                .collect(),
        }
    }

    #[test]
    fn test_zero_variant_draft_synthesizes_default_title() {
        let data = DraftData {
            title: "Plain Mug".to_string(),
            price: Some(Money::from_cents(1500)),
            cost: Some(Money::from_cents(700)),
            ..DraftData::default()
        };

        let (request, planned) = build_create_request(&data);
        assert_eq!(request.options.len(), 1);
        assert_eq!(request.options[0].name, "Title");
        assert_eq!(request.options[0].values, vec!["Default Title"]);
        assert_eq!(request.variants.len(), 1);
        assert_eq!(request.variants[0].price, "15.00");
        assert_eq!(request.variants[0].option1.as_deref(), Some("Default Title"));
        assert_eq!(planned[0].cost, Some(Money::from_cents(700)));
        assert_eq!(planned[0].quantity, None);
    }

    #[tokio::test]
    async fn test_create_user_error_aborts_before_side_effects() {
        let db = test_db().await;
        let draft = draft_with_variants(&[Some(500)], &[Some(3)]);
        db.drafts().insert(&draft).await.unwrap();

        let client = FakeShopClient::with_create(Err(ShopError::UserErrors(vec![UserError {
            field: Some("title".to_string()),
            message: "is taken".to_string(),
            code: None,
        }])));
        let pipeline = PublishPipeline::new(db.clone(), client);

        let err = pipeline.publish(&draft.id).await.unwrap_err();
        assert!(matches!(err, ShopError::UserErrors(_)));

        // No dependent call ran and the draft is untouched.
        assert!(pipeline.client.cost_calls.lock().unwrap().is_empty());
        assert_eq!(*pipeline.client.location_calls.lock().unwrap(), 0);
        assert!(pipeline.client.inventory_calls.lock().unwrap().is_empty());
        let stored = db.drafts().get(&draft.id).await.unwrap().unwrap();
        assert!(!stored.data.is_pushed);
    }

    #[tokio::test]
    async fn test_one_cost_failure_does_not_stop_the_rest() {
        let db = test_db().await;
        let draft = draft_with_variants(
            &[Some(100), Some(200), Some(300)],
            &[None, None, None],
        );
        db.drafts().insert(&draft).await.unwrap();

        let mut client =
            FakeShopClient::with_create(Ok(created("gid://shop/Product/777", 3)));
        client.fail_cost_for.insert(501);
        let pipeline = PublishPipeline::new(db.clone(), client);

        let outcome = pipeline.publish(&draft.id).await.unwrap();
        assert_eq!(outcome.state, PublishState::Published);
        assert_eq!(outcome.remote_product_id, 777);
        assert_eq!(outcome.step_errors.len(), 1);
        assert_eq!(outcome.step_errors[0].step, PublishStep::CostSync);

        // All three were attempted.
        let calls = pipeline.client.cost_calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (500, Money::from_cents(100)));
        assert_eq!(calls[2], (502, Money::from_cents(300)));

        // Pushed despite the partial failure.
        let stored = db.drafts().get(&draft.id).await.unwrap().unwrap();
        assert!(stored.data.is_pushed);
        assert_eq!(stored.data.remote_product_id, Some(777));
    }

    #[tokio::test]
    async fn test_inventory_batched_against_first_active_location() {
        let db = test_db().await;
        let draft = draft_with_variants(&[None, None], &[Some(4), Some(9)]);
        db.drafts().insert(&draft).await.unwrap();

        let mut client = FakeShopClient::with_create(Ok(created("gid://shop/Product/8", 2)));
        client.locations = vec![
            Location {
                id: 30,
                name: "Closed".to_string(),
                active: false,
            },
            Location {
                id: 31,
                name: "Warehouse".to_string(),
                active: true,
            },
        ];
        let pipeline = PublishPipeline::new(db.clone(), client);

        let outcome = pipeline.publish(&draft.id).await.unwrap();
        assert!(outcome.is_clean());

        let calls = pipeline.client.inventory_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let request = &calls[0];
        assert_eq!(request.reason, "correction");
        assert!(request.ignore_discrepancy);
        assert_eq!(request.quantities.len(), 2);
        assert_eq!(request.quantities[0].location_id, 31);
        assert_eq!(request.quantities[0].inventory_item_id, 500);
        assert_eq!(request.quantities[0].quantity, 4);
        assert_eq!(request.quantities[1].quantity, 9);
    }

    #[tokio::test]
    async fn test_missing_location_skips_inventory_but_publishes() {
        let db = test_db().await;
        let draft = draft_with_variants(&[None], &[Some(5)]);
        db.drafts().insert(&draft).await.unwrap();

        let client = FakeShopClient::with_create(Ok(created("gid://shop/Product/9", 1)));
        let pipeline = PublishPipeline::new(db.clone(), client);

        let outcome = pipeline.publish(&draft.id).await.unwrap();
        assert_eq!(outcome.state, PublishState::Published);
        assert_eq!(outcome.step_errors.len(), 1);
        assert_eq!(outcome.step_errors[0].step, PublishStep::LocationLookup);
        assert!(pipeline.client.inventory_calls.lock().unwrap().is_empty());

        let stored = db.drafts().get(&draft.id).await.unwrap().unwrap();
        assert!(stored.data.is_pushed);
    }

    #[tokio::test]
    async fn test_variant_count_mismatch_skips_dependent_steps() {
        let db = test_db().await;
        let draft = draft_with_variants(&[Some(100), Some(200)], &[Some(1), Some(2)]);
        db.drafts().insert(&draft).await.unwrap();

        let client = FakeShopClient::with_create(Ok(created("gid://shop/Product/10", 1)));
        let pipeline = PublishPipeline::new(db.clone(), client);

        let outcome = pipeline.publish(&draft.id).await.unwrap();
        assert_eq!(outcome.step_errors.len(), 1);
        assert_eq!(outcome.step_errors[0].step, PublishStep::Create);
        assert!(pipeline.client.cost_calls.lock().unwrap().is_empty());
        assert!(pipeline.client.inventory_calls.lock().unwrap().is_empty());

        // Still marked pushed: the remote product exists.
        let stored = db.drafts().get(&draft.id).await.unwrap().unwrap();
        assert!(stored.data.is_pushed);
        assert_eq!(stored.data.remote_product_id, Some(10));
    }

    #[tokio::test]
    async fn test_missing_draft_fails_before_any_call() {
        let db = test_db().await;
        let client = FakeShopClient::new();
        let pipeline = PublishPipeline::new(db, client);

        let err = pipeline.publish("no-such-draft").await.unwrap_err();
        assert!(matches!(err, ShopError::Core(CoreError::DraftNotFound(_))));
        assert!(pipeline.client.create_calls.lock().unwrap().is_empty());
    }
}
