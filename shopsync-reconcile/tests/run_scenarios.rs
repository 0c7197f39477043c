//! End-to-end pipeline scenarios against in-memory feed and platform fakes.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use shopsync_client::{ClientError, LocalFeed, ProductApi};
use shopsync_core::{
    AccessToken, LocalProduct, Price, RemoteId, RemoteProduct, Sku, SyncConfig, UpdatePlan,
};
use shopsync_reconcile::{pipeline, RunError};

const PUB: &str = "gid://shopify/Publication/9";

fn config() -> SyncConfig {
    SyncConfig {
        shop_url: "demo.myshopify.com".into(),
        token: AccessToken::new("shpat_test"),
        location_id: "gid://shopify/Location/1".into(),
        subfamilies: vec!["CABLES".into()],
        publication_id: PUB.into(),
        feed_url: "https://feed.test".into(),
        ca_bundle: None,
    }
}

fn local(sku: &str, cents: i64, stock: i64) -> LocalProduct {
    LocalProduct {
        sku: Sku::from(sku),
        ean: format!("84{sku}"),
        title: format!("Product {sku}"),
        description: String::new(),
        subfamily: "CABLES".into(),
        price: Price::from_cents(cents),
        stock,
        image_url: None,
    }
}

fn remote(sku: &str, cents: i64, quantity: i64) -> RemoteProduct {
    RemoteProduct {
        id: RemoteId::from(format!("gid://shopify/Product/{sku}")),
        variant_id: RemoteId::from(format!("gid://shopify/ProductVariant/{sku}")),
        inventory_item_id: RemoteId::from(format!("gid://shopify/InventoryItem/{sku}")),
        sku: Sku::from(sku),
        price: Price::from_cents(cents),
        quantity,
        publications: BTreeSet::from([PUB.to_owned()]),
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeFeed {
    products: Vec<LocalProduct>,
    fail: bool,
}

impl FakeFeed {
    fn with(products: Vec<LocalProduct>) -> Self {
        Self {
            products,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            products: vec![],
            fail: true,
        }
    }
}

impl LocalFeed for FakeFeed {
    fn fetch(&self, _subfamilies: &[String]) -> Result<Vec<LocalProduct>, ClientError> {
        if self.fail {
            return Err(ClientError::RetriesExhausted {
                attempts: 5,
                last: "HTTP 503".into(),
            });
        }
        Ok(self.products.clone())
    }
}

#[derive(Default)]
struct FakeApi {
    catalog: HashMap<Sku, RemoteProduct>,
    fail_skus: HashSet<Sku>,
    created: RefCell<Vec<Sku>>,
    updated: RefCell<Vec<(Sku, UpdatePlan)>>,
    published: RefCell<Vec<RemoteId>>,
}

impl FakeApi {
    fn with_catalog(items: Vec<RemoteProduct>) -> Self {
        Self {
            catalog: items.into_iter().map(|p| (p.sku.clone(), p)).collect(),
            ..Default::default()
        }
    }

    fn failing_on(mut self, sku: &str) -> Self {
        self.fail_skus.insert(Sku::from(sku));
        self
    }

    fn mutation_count(&self) -> usize {
        self.created.borrow().len() + self.updated.borrow().len() + self.published.borrow().len()
    }
}

impl ProductApi for FakeApi {
    fn fetch_catalog(&self) -> Result<HashMap<Sku, RemoteProduct>, ClientError> {
        Ok(self.catalog.clone())
    }

    fn create_product(&self, product: &LocalProduct) -> Result<RemoteId, ClientError> {
        if self.fail_skus.contains(&product.sku) {
            return Err(ClientError::Transport {
                reason: "connection reset by peer".into(),
            });
        }
        self.created.borrow_mut().push(product.sku.clone());
        Ok(RemoteId::from(format!("gid://shopify/Product/{}", product.sku)))
    }

    fn update_product(&self, remote: &RemoteProduct, plan: &UpdatePlan) -> Result<(), ClientError> {
        if self.fail_skus.contains(&remote.sku) {
            return Err(ClientError::Transport {
                reason: "connection reset by peer".into(),
            });
        }
        self.updated
            .borrow_mut()
            .push((remote.sku.clone(), plan.clone()));
        Ok(())
    }

    fn publish_product(&self, id: &RemoteId) -> Result<(), ClientError> {
        self.published.borrow_mut().push(id.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn create_missing_product() {
    let feed = FakeFeed::with(vec![local("A", 1000, 5)]);
    let api = FakeApi::with_catalog(vec![]);

    let report = pipeline::run(&config(), &feed, &api, false).expect("run");

    assert_eq!(report.apply.created, 1);
    assert_eq!(report.apply.updated, 0);
    assert_eq!(report.apply.failed(), 0);
    assert_eq!(api.created.borrow().as_slice(), &[Sku::from("A")]);
    // A freshly created product is published to the configured channel.
    assert_eq!(api.published.borrow().len(), 1);
}

#[test]
fn price_drift_updates_price_only() {
    let feed = FakeFeed::with(vec![local("A", 1200, 5)]);
    let api = FakeApi::with_catalog(vec![remote("A", 1000, 5)]);

    let report = pipeline::run(&config(), &feed, &api, false).expect("run");

    assert_eq!(report.apply.updated, 1);
    assert_eq!(report.apply.created, 0);
    let updated = api.updated.borrow();
    let (sku, plan) = &updated[0];
    assert_eq!(*sku, Sku::from("A"));
    assert_eq!(plan.price, Some(Price::from_cents(1200)));
    assert_eq!(plan.quantity, None);
    assert!(!plan.publish);
}

#[test]
fn synced_catalog_is_a_no_op() {
    let feed = FakeFeed::with(vec![local("A", 1000, 5), local("B", 700, 2)]);
    let api = FakeApi::with_catalog(vec![remote("A", 1000, 5), remote("B", 700, 2)]);

    let report = pipeline::run(&config(), &feed, &api, false).expect("run");

    assert_eq!(report.diff.unchanged, 2);
    assert!(report.diff.is_empty());
    assert_eq!(api.mutation_count(), 0, "idempotent re-run must apply nothing");
}

#[test]
fn one_failure_does_not_abort_the_run() {
    let feed = FakeFeed::with(vec![
        local("A", 1000, 5),
        local("B", 700, 2),
        local("C", 500, 1),
    ]);
    let api = FakeApi::with_catalog(vec![]).failing_on("B");

    let report = pipeline::run(&config(), &feed, &api, false).expect("run");

    assert_eq!(report.apply.created, 2);
    assert_eq!(report.apply.failed(), 1);
    let failure = &report.apply.failures[0];
    assert_eq!(failure.sku, Sku::from("B"));
    assert!(failure.reason.contains("connection reset"));

    // Default tolerance: partial sync still counts as success.
    assert!(report.within_tolerance(None));
    assert!(!report.within_tolerance(Some(0)));
    assert!(report.within_tolerance(Some(1)));
}

#[test]
fn feed_failure_fails_the_run() {
    let feed = FakeFeed::failing();
    let api = FakeApi::with_catalog(vec![]);

    let err = pipeline::run(&config(), &feed, &api, false).expect_err("must fail");
    assert!(matches!(err, RunError::Feed(_)));
    assert_eq!(api.mutation_count(), 0);
}

#[test]
fn dry_run_applies_nothing() {
    let feed = FakeFeed::with(vec![local("A", 1200, 5), local("NEW", 900, 1)]);
    let api = FakeApi::with_catalog(vec![remote("A", 1000, 5)]);

    let report = pipeline::run(&config(), &feed, &api, true).expect("run");

    assert!(report.dry_run);
    assert_eq!(report.diff.to_create.len(), 1);
    assert_eq!(report.diff.to_update.len(), 1);
    assert_eq!(report.apply.created + report.apply.updated, 0);
    assert_eq!(api.mutation_count(), 0, "dry-run must not mutate the shop");
}
