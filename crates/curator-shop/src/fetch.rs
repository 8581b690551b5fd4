//! # Live Catalog Fetch
//!
//! Pulls the full live catalog page by page and lowers wire variants
//! into core [`Variant`] records.
//!
//! ## Pagination Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  page 1 (full)  →  page 2 (full)  →  page 3 (short or empty)  →  stop  │
//! │                                                                         │
//! │  A page shorter than page_size, an empty page, or a missing next       │
//! │  cursor all terminate the loop.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use crate::client::{ShopClient, WireProduct, WireVariant};
use crate::error::ShopResult;
use curator_core::{coerce_money, InternalMeta, Money, Variant};

/// Fetches the entire live catalog as flat variant rows.
///
/// Variants keep platform order: products in page order, variants in
/// product order. The hierarchy builder depends on that for stable
/// group ordering.
pub async fn fetch_live_snapshot<C: ShopClient>(
    client: &C,
    page_size: u32,
) -> ShopResult<Vec<Variant>> {
    let mut variants = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = client.list_products(page_size, cursor.as_deref()).await?;
        pages += 1;
        debug!(page = pages, products = page.products.len(), "Fetched product page");

        let short_page = page.products.len() < page_size as usize;
        for product in &page.products {
            for wire in &product.variants {
                variants.push(lower_variant(product, wire)?);
            }
        }

        cursor = page.next_page_info;
        if short_page || cursor.is_none() {
            break;
        }
    }

    info!(variants = variants.len(), pages, "Live snapshot fetched");
    Ok(variants)
}

/// Lowers one wire variant into the core model.
///
/// Price fields go through numeric coercion so string and number wire
/// forms land on the same cents value. A variant with no usable price
/// is treated as zero rather than dropped.
pub fn lower_variant(product: &WireProduct, wire: &WireVariant) -> ShopResult<Variant> {
    let price = coerce_money(wire.price.as_ref())?.unwrap_or(Money::zero());
    let compare_at_price = coerce_money(wire.compare_at_price.as_ref())?;

    Ok(Variant {
        variant_id: wire.id,
        product_id: wire.product_id,
        title: variant_title(product, wire),
        sku: wire.sku.clone().unwrap_or_default(),
        price,
        compare_at_price,
        inventory_quantity: wire.inventory_quantity.unwrap_or(0),
        weight_grams: wire.grams,
        image_url: resolve_image(product, wire),
        meta: InternalMeta::default(),
    })
}

/// Combined display title: `"{product} - {variant}"`, or just the
/// product title for the platform's synthetic single-variant name.
fn variant_title(product: &WireProduct, wire: &WireVariant) -> String {
    if wire.title.is_empty() || wire.title == "Default Title" {
        product.title.clone()
    } else {
        format!("{} - {}", product.title, wire.title)
    }
}

/// Resolves a variant image: the variant's own image id wins, then the
/// product's featured image, else none.
fn resolve_image(product: &WireProduct, wire: &WireVariant) -> Option<String> {
    if let Some(image_id) = wire.image_id {
        if let Some(image) = product.images.iter().find(|i| i.id == image_id) {
            return Some(image.src.clone());
        }
    }
    product.image.as_ref().map(|i| i.src.clone())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::WireImage;
    use crate::testing::FakeShopClient;
    use serde_json::json;

    fn wire_product(id: i64, title: &str, variant_ids: &[i64]) -> WireProduct {
        WireProduct {
            id,
            title: title.to_string(),
            image: None,
            images: vec![],
            variants: variant_ids
                .iter()
                .map(|&vid| WireVariant {
                    id: vid,
                    product_id: id,
                    title: format!("V{vid}"),
                    sku: Some(format!("SKU-{vid}")),
                    price: Some(json!("12.00")),
                    compare_at_price: None,
                    inventory_quantity: Some(3),
                    grams: None,
                    image_id: None,
                    inventory_item_id: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_fetch_walks_pages_until_short_page() {
        let mut client = FakeShopClient::new();
        client.pages = vec![
            vec![wire_product(1, "A", &[11]), wire_product(2, "B", &[21])],
            vec![wire_product(3, "C", &[31])],
        ];

        let variants = fetch_live_snapshot(&client, 2).await.unwrap();
        let ids: Vec<i64> = variants.iter().map(|v| v.variant_id).collect();
        assert_eq!(ids, vec![11, 21, 31]);
        assert_eq!(variants[0].price, Money::from_cents(1200));
    }

    #[tokio::test]
    async fn test_fetch_empty_catalog() {
        let mut client = FakeShopClient::new();
        client.pages = vec![vec![]];
        let variants = fetch_live_snapshot(&client, 50).await.unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_lower_variant_string_and_number_prices_agree() {
        let product = wire_product(1, "Mug", &[]);
        let mut wire = WireVariant {
            id: 5,
            product_id: 1,
            title: "Blue".to_string(),
            sku: None,
            price: Some(json!("10.50")),
            compare_at_price: Some(json!(12)),
            inventory_quantity: None,
            grams: Some(300.0),
            image_id: None,
            inventory_item_id: None,
        };

        let from_string = lower_variant(&product, &wire).unwrap();
        wire.price = Some(json!(10.5));
        let from_number = lower_variant(&product, &wire).unwrap();

        assert_eq!(from_string.price, from_number.price);
        assert_eq!(from_string.compare_at_price, Some(Money::from_cents(1200)));
        assert_eq!(from_string.title, "Mug - Blue");
        assert_eq!(from_string.inventory_quantity, 0);
    }

    #[test]
    fn test_default_title_collapses_to_product_title() {
        let product = wire_product(1, "Mug", &[]);
        let wire = WireVariant {
            id: 5,
            product_id: 1,
            title: "Default Title".to_string(),
            sku: None,
            price: Some(json!("9.99")),
            compare_at_price: None,
            inventory_quantity: Some(1),
            grams: None,
            image_id: None,
            inventory_item_id: None,
        };
        assert_eq!(lower_variant(&product, &wire).unwrap().title, "Mug");
    }

    #[test]
    fn test_image_resolution_prefers_variant_override() {
        let mut product = wire_product(1, "Mug", &[]);
        product.image = Some(WireImage {
            id: 900,
            src: "https://img.example/featured.jpg".to_string(),
        });
        product.images = vec![WireImage {
            id: 901,
            src: "https://img.example/blue.jpg".to_string(),
        }];

        let mut wire = WireVariant {
            id: 5,
            product_id: 1,
            title: "Blue".to_string(),
            sku: None,
            price: Some(json!("9.99")),
            compare_at_price: None,
            inventory_quantity: None,
            grams: None,
            image_id: Some(901),
            inventory_item_id: None,
        };
        assert_eq!(
            resolve_image(&product, &wire).as_deref(),
            Some("https://img.example/blue.jpg")
        );

        // Unknown override falls back to the featured image.
        wire.image_id = Some(999);
        assert_eq!(
            resolve_image(&product, &wire).as_deref(),
            Some("https://img.example/featured.jpg")
        );
    }
}
