//! In-memory [`ShopClient`] used across this crate's tests.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::client::{
    CreateProductRequest, CreatedProduct, Location, ProductPage, SetInventoryRequest, ShopClient,
    WireProduct,
};
use crate::error::{ShopError, ShopResult};
use curator_core::Money;

/// Scripted platform double: serves canned pages and records every call.
#[derive(Default)]
pub struct FakeShopClient {
    /// Product pages served in order by `list_products`.
    pub pages: Vec<Vec<WireProduct>>,
    page_cursor: Mutex<usize>,

    /// Result handed back by `create_product`; `None` means "not scripted"
    /// and fails the test loudly.
    pub create_result: Mutex<Option<Result<CreatedProduct, ShopError>>>,
    pub create_calls: Mutex<Vec<CreateProductRequest>>,

    /// Inventory item ids whose cost update should fail.
    pub fail_cost_for: HashSet<i64>,
    pub cost_calls: Mutex<Vec<(i64, Money)>>,

    pub locations: Vec<Location>,
    pub location_calls: Mutex<usize>,

    pub inventory_calls: Mutex<Vec<SetInventoryRequest>>,
}

impl FakeShopClient {
    pub fn new() -> Self {
        FakeShopClient::default()
    }

    pub fn with_create(result: Result<CreatedProduct, ShopError>) -> Self {
        let fake = FakeShopClient::new();
        *fake.create_result.lock().unwrap() = Some(result);
        fake
    }
}

impl ShopClient for FakeShopClient {
    async fn list_products(
        &self,
        _page_size: u32,
        _page_info: Option<&str>,
    ) -> ShopResult<ProductPage> {
        let mut cursor = self.page_cursor.lock().unwrap();
        let products = self.pages.get(*cursor).cloned().unwrap_or_default();
        *cursor += 1;
        let next_page_info = if *cursor < self.pages.len() {
            Some(format!("page-{}", *cursor))
        } else {
            None
        };
        Ok(ProductPage {
            products,
            next_page_info,
        })
    }

    async fn create_product(&self, request: &CreateProductRequest) -> ShopResult<CreatedProduct> {
        self.create_calls.lock().unwrap().push(request.clone());
        self.create_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ShopError::RequestFailed(
                "create_product not scripted".to_string(),
            )))
    }

    async fn update_variant_cost(&self, inventory_item_id: i64, cost: Money) -> ShopResult<()> {
        self.cost_calls.lock().unwrap().push((inventory_item_id, cost));
        if self.fail_cost_for.contains(&inventory_item_id) {
            return Err(ShopError::HttpStatus {
                status: 500,
                body: "cost update failed".to_string(),
            });
        }
        Ok(())
    }

    async fn list_locations(&self, _limit: u32, active_only: bool) -> ShopResult<Vec<Location>> {
        *self.location_calls.lock().unwrap() += 1;
        let mut locations = self.locations.clone();
        if active_only {
            locations.retain(|l| l.active);
        }
        Ok(locations)
    }

    async fn set_inventory_quantities(&self, request: &SetInventoryRequest) -> ShopResult<()> {
        self.inventory_calls.lock().unwrap().push(request.clone());
        Ok(())
    }
}
