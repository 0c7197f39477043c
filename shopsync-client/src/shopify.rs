//! Shopify Admin GraphQL client: paginated catalog snapshot plus the
//! per-item mutations the reconciler applies.

use std::collections::HashMap;

use serde_json::{json, Value};

use shopsync_core::{LocalProduct, Price, RemoteId, RemoteProduct, Sku, UpdatePlan};

use crate::error::ClientError;
use crate::http::GraphqlTransport;

/// Tag marking products this job manages; the catalog fetch is scoped to it
/// so hand-created shop products are never touched.
pub const IMPORT_TAG: &str = "ImportadoAPI";

const CATALOG_QUERY: &str = r#"
query catalogPage($cursor: String, $locationId: ID!) {
  products(first: 100, after: $cursor, query: "tag:ImportadoAPI") {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      resourcePublications(first: 20) { nodes { publication { id } } }
      variants(first: 1) {
        nodes {
          id
          sku
          price
          inventoryItem {
            id
            inventoryLevel(locationId: $locationId) {
              quantities(names: ["available"]) { name quantity }
            }
          }
        }
      }
    }
  }
}"#;

const PRODUCT_SET_MUTATION: &str = r#"
mutation productUpsert($input: ProductSetInput!) {
  productSet(input: $input, synchronous: true) {
    product { id }
    userErrors { field message }
  }
}"#;

const PRICE_MUTATION: &str = r#"
mutation updateVariantPrice($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    userErrors { field message }
  }
}"#;

const INVENTORY_MUTATION: &str = r#"
mutation setOnHand($input: InventorySetOnHandQuantitiesInput!) {
  inventorySetOnHandQuantities(input: $input) {
    userErrors { field message }
  }
}"#;

const PUBLISH_MUTATION: &str = r#"
mutation publishProduct($id: ID!, $input: [PublicationInput!]!) {
  publishablePublish(id: $id, input: $input) {
    userErrors { field message }
  }
}"#;

// ---------------------------------------------------------------------------
// ProductApi
// ---------------------------------------------------------------------------

/// Remote-platform operations the reconciler needs. One implementation per
/// shop; tests substitute in-memory fakes.
pub trait ProductApi {
    /// Full remote snapshot of managed products, keyed by SKU.
    fn fetch_catalog(&self) -> Result<HashMap<Sku, RemoteProduct>, ClientError>;

    /// Create (or upsert by handle) a product with its variant, price and
    /// inventory level. Returns the remote product id.
    fn create_product(&self, product: &LocalProduct) -> Result<RemoteId, ClientError>;

    /// Apply the mutations named by `plan` to an existing product.
    fn update_product(&self, remote: &RemoteProduct, plan: &UpdatePlan) -> Result<(), ClientError>;

    /// Make the product visible on the configured publication.
    fn publish_product(&self, id: &RemoteId) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// ShopifyClient
// ---------------------------------------------------------------------------

/// Admin API client, generic over the transport seam.
pub struct ShopifyClient<T> {
    transport: T,
    location_id: String,
    publication_id: String,
}

impl<T: GraphqlTransport> ShopifyClient<T> {
    pub fn new(transport: T, location_id: impl Into<String>, publication_id: impl Into<String>) -> Self {
        Self {
            transport,
            location_id: location_id.into(),
            publication_id: publication_id.into(),
        }
    }
}

impl<T: GraphqlTransport> ProductApi for ShopifyClient<T> {
    fn fetch_catalog(&self) -> Result<HashMap<Sku, RemoteProduct>, ClientError> {
        let mut snapshot = HashMap::new();
        let mut cursor: Option<String> = None;

        loop {
            let data = self.transport.execute(
                CATALOG_QUERY,
                json!({ "cursor": cursor, "locationId": self.location_id }),
            )?;
            let page = data
                .get("products")
                .ok_or_else(|| ClientError::decode("missing products connection"))?;
            let nodes = page
                .get("nodes")
                .and_then(Value::as_array)
                .ok_or_else(|| ClientError::decode("missing product nodes"))?;

            for node in nodes {
                match parse_product_node(node) {
                    Some(product) => {
                        snapshot.insert(product.sku.clone(), product);
                    }
                    None => tracing::warn!("skipping product node without usable variant"),
                }
            }

            let has_next = page
                .pointer("/pageInfo/hasNextPage")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !has_next {
                break;
            }
            cursor = page
                .pointer("/pageInfo/endCursor")
                .and_then(Value::as_str)
                .map(str::to_owned);
            if cursor.is_none() {
                return Err(ClientError::decode("hasNextPage set but endCursor missing"));
            }
        }

        tracing::info!("fetched {} remote products", snapshot.len());
        Ok(snapshot)
    }

    fn create_product(&self, product: &LocalProduct) -> Result<RemoteId, ClientError> {
        let data = self.transport.execute(
            PRODUCT_SET_MUTATION,
            json!({ "input": build_product_input(product, &self.location_id) }),
        )?;
        check_user_errors(&data, "productSet")?;
        data.pointer("/productSet/product/id")
            .and_then(Value::as_str)
            .map(RemoteId::from)
            .ok_or_else(|| ClientError::decode("productSet returned no product id"))
    }

    fn update_product(&self, remote: &RemoteProduct, plan: &UpdatePlan) -> Result<(), ClientError> {
        if let Some(price) = plan.price {
            self.update_price(remote, price)?;
        }
        if let Some(quantity) = plan.quantity {
            self.set_inventory(remote, quantity)?;
        }
        if plan.publish {
            self.publish_product(&remote.id)?;
        }
        Ok(())
    }

    fn publish_product(&self, id: &RemoteId) -> Result<(), ClientError> {
        let data = self.transport.execute(
            PUBLISH_MUTATION,
            json!({
                "id": id.0,
                "input": [{ "publicationId": self.publication_id }]
            }),
        )?;
        check_user_errors(&data, "publishablePublish")
    }
}

impl<T: GraphqlTransport> ShopifyClient<T> {
    fn update_price(&self, remote: &RemoteProduct, price: Price) -> Result<(), ClientError> {
        let data = self.transport.execute(
            PRICE_MUTATION,
            json!({
                "productId": remote.id.0,
                "variants": [{ "id": remote.variant_id.0, "price": price.to_string() }]
            }),
        )?;
        check_user_errors(&data, "productVariantsBulkUpdate")
    }

    fn set_inventory(&self, remote: &RemoteProduct, quantity: i64) -> Result<(), ClientError> {
        let data = self.transport.execute(
            INVENTORY_MUTATION,
            json!({
                "input": {
                    "reason": "correction",
                    "setQuantities": [{
                        "inventoryItemId": remote.inventory_item_id.0,
                        "locationId": self.location_id,
                        "quantity": quantity
                    }]
                }
            }),
        )?;
        check_user_errors(&data, "inventorySetOnHandQuantities")
    }
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// `ProductSetInput` payload for one feed product.
pub(crate) fn build_product_input(product: &LocalProduct, location_id: &str) -> Value {
    let mut input = json!({
        "handle": product.handle(),
        "title": product.title,
        "descriptionHtml": product.description,
        "status": "ACTIVE",
        "productType": product.subfamily,
        "tags": [IMPORT_TAG],
        "productOptions": [
            { "name": "SKU", "values": [{ "name": product.sku.0 }] }
        ],
        "variants": [{
            "sku": product.sku.0,
            "barcode": product.ean,
            "price": product.price.to_string(),
            "inventoryPolicy": "DENY",
            "inventoryItem": { "tracked": true },
            "inventoryQuantities": [
                { "locationId": location_id, "name": "available", "quantity": product.stock }
            ],
            "optionValues": [
                { "name": product.sku.0, "optionName": "SKU" }
            ]
        }]
    });
    if let Some(img) = &product.image_url {
        input["files"] = json!([{ "alt": product.title, "originalSource": img }]);
    }
    input
}

/// Parse one catalog node; `None` when the node lacks a usable variant/SKU.
fn parse_product_node(node: &Value) -> Option<RemoteProduct> {
    let id = node.get("id")?.as_str()?;
    let variant = node.pointer("/variants/nodes/0")?;
    let sku = variant.get("sku")?.as_str().filter(|s| !s.is_empty())?;
    let variant_id = variant.get("id")?.as_str()?;
    let price = Price::parse_api(variant.get("price")?.as_str()?)?;
    let inventory_item = variant.get("inventoryItem")?;
    let inventory_item_id = inventory_item.get("id")?.as_str()?;
    let quantity = inventory_item
        .pointer("/inventoryLevel/quantities/0/quantity")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let publications = node
        .pointer("/resourcePublications/nodes")
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| n.pointer("/publication/id").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Some(RemoteProduct {
        id: RemoteId::from(id),
        variant_id: RemoteId::from(variant_id),
        inventory_item_id: RemoteId::from(inventory_item_id),
        sku: Sku::from(sku),
        price,
        quantity,
        publications,
    })
}

/// Surface mutation `userErrors` as a [`ClientError::Api`].
fn check_user_errors(data: &Value, operation: &str) -> Result<(), ClientError> {
    let payload = data
        .get(operation)
        .ok_or_else(|| ClientError::decode(format!("missing {operation} payload")))?;
    let errors = payload
        .get("userErrors")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| {
            let field = e
                .get("field")
                .map(ToString::to_string)
                .unwrap_or_else(|| "?".into());
            let msg = e.get("message").and_then(Value::as_str).unwrap_or("unknown");
            format!("{operation} {field}: {msg}")
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(ClientError::Api { message })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
