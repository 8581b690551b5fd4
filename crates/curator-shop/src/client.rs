//! # Platform Client
//!
//! The Admin API surface this system depends on, expressed as a trait so
//! the committer and publish pipeline can run against a fake in tests.
//!
//! ## Call Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopClient Operations                            │
//! │                                                                         │
//! │  list_products            GET  /products.json        (paginated)       │
//! │  create_product           POST /products.json        (nested payload)  │
//! │  update_variant_cost      PUT  /inventory_items/{id}.json              │
//! │  list_locations           GET  /locations.json                         │
//! │  set_inventory_quantities POST /inventory_levels/set_on_hand.json      │
//! │                                                                         │
//! │  Auth: access token header on every request.                           │
//! │  Pagination: opaque page_info cursor from the Link response header.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use reqwest::header::{HeaderMap, HeaderValue, LINK};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ShopConfig;
use crate::error::{ShopError, ShopResult, UserError};
use curator_core::Money;

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

// =============================================================================
// Wire Types: Live Catalog Fetch
// =============================================================================

/// One page of products from the live catalog.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<WireProduct>,
    /// Cursor for the next page, absent on the last page.
    pub next_page_info: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireProduct {
    pub id: i64,
    pub title: String,
    /// Featured image, used as the variant fallback.
    #[serde(default)]
    pub image: Option<WireImage>,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub variants: Vec<WireVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireImage {
    pub id: i64,
    pub src: String,
}

/// Raw variant as the platform serializes it.
///
/// Price fields arrive as decimal-bearing strings on some endpoints and
/// as bare numbers on others, so they stay as [`Value`] until coerced.
#[derive(Debug, Clone, Deserialize)]
pub struct WireVariant {
    pub id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub compare_at_price: Option<Value>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    /// Weight in grams.
    #[serde(default)]
    pub grams: Option<f64>,
    /// Variant-specific image override.
    #[serde(default)]
    pub image_id: Option<i64>,
    #[serde(default)]
    pub inventory_item_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProductListBody {
    products: Vec<WireProduct>,
}

// =============================================================================
// Wire Types: Product Creation
// =============================================================================

/// Nested product-creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    pub status: String,
    pub options: Vec<NewOption>,
    pub variants: Vec<NewVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOption {
    pub name: String,
    pub values: Vec<String>,
}

/// Variant inside a create request. Prices travel as decimal strings.
#[derive(Debug, Clone, Serialize)]
pub struct NewVariant {
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Weight in grams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateProductBody<'a> {
    product: &'a CreateProductRequest,
}

/// The platform's answer to a successful create.
///
/// Variants come back in request order; the adapter relies on that index
/// alignment for the dependent cost and inventory calls.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProduct {
    pub id: i64,
    /// Opaque global id, e.g. `gid://shop/Product/123`.
    pub admin_graphql_api_id: String,
    pub status: String,
    pub variants: Vec<CreatedVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedVariant {
    pub id: i64,
    #[serde(default)]
    pub inventory_item_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateProductResponseBody {
    product: CreatedProduct,
}

#[derive(Debug, Deserialize)]
struct UserErrorBody {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

// =============================================================================
// Wire Types: Dependent Calls
// =============================================================================

/// A fulfillment location.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
struct LocationListBody {
    locations: Vec<Location>,
}

/// Absolute on-hand quantity correction, batched per publish.
#[derive(Debug, Clone, Serialize)]
pub struct SetInventoryRequest {
    /// Audit reason tag, e.g. `correction`.
    pub reason: String,
    /// Skip the platform's discrepancy check against its own expected value.
    pub ignore_discrepancy: bool,
    pub quantities: Vec<InventoryQuantity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryQuantity {
    pub inventory_item_id: i64,
    pub location_id: i64,
    /// Absolute on-hand value, not a delta.
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
struct InventoryItemCostBody {
    inventory_item: InventoryItemCost,
}

#[derive(Debug, Serialize)]
struct InventoryItemCost {
    cost: String,
}

// =============================================================================
// Client Trait
// =============================================================================

/// Every platform call the engine makes.
///
/// Constructed once at process start and injected into the fetcher and
/// publish pipeline, never held as ambient global state.
#[allow(async_fn_in_trait)]
pub trait ShopClient: Send + Sync {
    /// Fetches one page of the live catalog.
    async fn list_products(
        &self,
        page_size: u32,
        page_info: Option<&str>,
    ) -> ShopResult<ProductPage>;

    /// Creates a product with nested options and variants.
    ///
    /// Structured validation failures surface as
    /// [`ShopError::UserErrors`]; nothing was created in that case.
    async fn create_product(&self, request: &CreateProductRequest) -> ShopResult<CreatedProduct>;

    /// Sets the unit cost on one inventory item.
    async fn update_variant_cost(&self, inventory_item_id: i64, cost: Money) -> ShopResult<()>;

    /// Lists fulfillment locations.
    async fn list_locations(&self, limit: u32, active_only: bool) -> ShopResult<Vec<Location>>;

    /// Applies a batch of absolute on-hand quantity corrections.
    async fn set_inventory_quantities(&self, request: &SetInventoryRequest) -> ShopResult<()>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// Production [`ShopClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct RestShopClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl RestShopClient {
    /// Builds a client from validated configuration.
    pub fn new(config: &ShopConfig) -> ShopResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::RequestFailed(e.to_string()))?;

        Ok(RestShopClient {
            http,
            base_url: config.api_base(),
            access_token: config.shop.access_token.clone(),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(ACCESS_TOKEN_HEADER, &self.access_token)
    }

    /// Maps a non-success response to an error, decoding a structured
    /// user-error body when the platform provides one.
    async fn check(response: reqwest::Response) -> ShopResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<UserErrorBody>(&body) {
            if !parsed.user_errors.is_empty() {
                return Err(ShopError::UserErrors(parsed.user_errors));
            }
        }
        Err(ShopError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

impl ShopClient for RestShopClient {
    async fn list_products(
        &self,
        page_size: u32,
        page_info: Option<&str>,
    ) -> ShopResult<ProductPage> {
        let url = format!("{}/products.json", self.base_url);
        let mut query: Vec<(&str, String)> = vec![("limit", page_size.to_string())];
        if let Some(cursor) = page_info {
            query.push(("page_info", cursor.to_string()));
        }
        debug!(page_size, cursor = ?page_info, "Fetching product page");

        let response = self.auth(self.http.get(&url).query(&query)).send().await?;
        let response = Self::check(response).await?;

        let next_page_info = next_cursor(response.headers());
        let body: ProductListBody = response.json().await?;

        Ok(ProductPage {
            products: body.products,
            next_page_info,
        })
    }

    async fn create_product(&self, request: &CreateProductRequest) -> ShopResult<CreatedProduct> {
        let url = format!("{}/products.json", self.base_url);
        debug!(title = %request.title, variants = request.variants.len(), "Creating product");

        let response = self
            .auth(self.http.post(&url).json(&CreateProductBody { product: request }))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: CreateProductResponseBody = response.json().await?;
        Ok(body.product)
    }

    async fn update_variant_cost(&self, inventory_item_id: i64, cost: Money) -> ShopResult<()> {
        let url = format!("{}/inventory_items/{inventory_item_id}.json", self.base_url);
        let body = InventoryItemCostBody {
            inventory_item: InventoryItemCost {
                cost: cost.to_decimal_string(),
            },
        };

        let response = self.auth(self.http.put(&url).json(&body)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_locations(&self, limit: u32, active_only: bool) -> ShopResult<Vec<Location>> {
        let url = format!("{}/locations.json", self.base_url);
        let response = self
            .auth(self.http.get(&url).query(&[("limit", limit.to_string())]))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: LocationListBody = response.json().await?;
        let mut locations = body.locations;
        if active_only {
            locations.retain(|l| l.active);
        }
        Ok(locations)
    }

    async fn set_inventory_quantities(&self, request: &SetInventoryRequest) -> ShopResult<()> {
        let url = format!("{}/inventory_levels/set_on_hand.json", self.base_url);
        debug!(count = request.quantities.len(), "Setting on-hand quantities");

        let response = self.auth(self.http.post(&url).json(request)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Extracts the trailing numeric suffix from an opaque global id,
/// e.g. `gid://shop/Product/123` → `123`.
pub fn parse_gid(gid: &str) -> ShopResult<i64> {
    gid.rsplit('/')
        .next()
        .and_then(|tail| tail.parse::<i64>().ok())
        .ok_or_else(|| ShopError::InvalidRemoteId(gid.to_string()))
}

/// Pulls the `page_info` cursor out of a `Link: <...>; rel="next"` header.
fn next_cursor(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK).and_then(|v: &HeaderValue| v.to_str().ok())?;
    for part in link.split(',') {
        if !part.contains("rel=\"next\"") {
            continue;
        }
        let url = part.split('<').nth(1)?.split('>').next()?;
        for pair in url.split('?').nth(1)?.split('&') {
            if let Some(cursor) = pair.strip_prefix("page_info=") {
                return Some(cursor.to_string());
            }
        }
    }
    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gid_trailing_numeric() {
        assert_eq!(parse_gid("gid://shop/Product/8801234").unwrap(), 8801234);
        assert_eq!(parse_gid("12345").unwrap(), 12345);
        assert!(parse_gid("gid://shop/Product/abc").is_err());
        assert!(parse_gid("").is_err());
    }

    #[test]
    fn test_next_cursor_parses_link_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://x.example/admin/api/2024-07/products.json?limit=50&page_info=abc123>; rel=\"next\"",
            ),
        );
        assert_eq!(next_cursor(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://x.example/products.json?page_info=prev1>; rel=\"previous\"",
            ),
        );
        assert_eq!(next_cursor(&headers), None);
        assert_eq!(next_cursor(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wire_variant_accepts_string_and_number_prices() {
        let as_string: WireVariant = serde_json::from_str(
            r#"{"id": 1, "product_id": 2, "title": "A", "price": "12.00"}"#,
        )
        .unwrap();
        let as_number: WireVariant = serde_json::from_str(
            r#"{"id": 1, "product_id": 2, "title": "A", "price": 12.0}"#,
        )
        .unwrap();
        assert!(as_string.price.is_some());
        assert!(as_number.price.is_some());
    }

    #[test]
    fn test_user_error_body_decodes() {
        let body: UserErrorBody = serde_json::from_str(
            r#"{"user_errors": [{"field": "title", "message": "can't be blank", "code": "BLANK"}]}"#,
        )
        .unwrap();
        assert_eq!(body.user_errors.len(), 1);
        assert_eq!(body.user_errors[0].field.as_deref(), Some("title"));
    }

    #[test]
    fn test_create_request_skips_absent_fields() {
        let request = CreateProductRequest {
            title: "T".to_string(),
            body_html: None,
            vendor: None,
            product_type: None,
            status: "active".to_string(),
            options: vec![],
            variants: vec![NewVariant {
                price: "10.00".to_string(),
                sku: None,
                grams: None,
                compare_at_price: None,
                option1: Some("Default Title".to_string()),
                option2: None,
                option3: None,
            }],
        };
        let json = serde_json::to_string(&CreateProductBody { product: &request }).unwrap();
        assert!(!json.contains("vendor"));
        assert!(!json.contains("compare_at_price"));
        assert!(json.contains("\"option1\":\"Default Title\""));
    }
}
