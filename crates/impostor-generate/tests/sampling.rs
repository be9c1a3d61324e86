use std::sync::Arc;

use serde_json::Value;

use impostor_core::{CountRange, FieldSpec, IdKind, ModelOptions, ModelRegistry, Transform};
use impostor_generate::{GenerationError, LoadState, ObjectKey, ObjectStore, StoreOptions};

/// A shop whose stores own `owned` products and sample three as top sellers.
fn shop(owned: CountRange, product_store: Option<Transform>, options: StoreOptions) -> ObjectStore {
    let mut registry = ModelRegistry::new();
    registry
        .add_model(
            "product",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                ("name", FieldSpec::words(CountRange::new(1.0, 4.0))),
                ("price", FieldSpec::currency(CountRange::new(1.0, 100.0))),
                ("store", FieldSpec::owner("store", product_store)),
            ],
            ModelOptions::default().with_preview(["name"]),
        )
        .expect("register product")
        .add_model(
            "store",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                ("name", FieldSpec::word()),
                (
                    "top_sellers",
                    FieldSpec::owned_set_of("product", Some(CountRange::exactly(3.0)), None),
                ),
            ],
            ModelOptions::default()
                .with_preview(["name"])
                .with_owns("product", owned),
        )
        .expect("register store");

    let catalog = registry.realize().expect("shop realizes");
    ObjectStore::new(Arc::new(catalog), options)
}

fn id_of(value: &Value) -> String {
    value
        .get("id")
        .and_then(Value::as_str)
        .expect("record has a string id")
        .to_string()
}

#[test]
fn owned_set_links_every_minted_child() {
    let mut store = shop(
        CountRange::exactly(5.0),
        Some(Transform::pick(["id", "name"])),
        StoreOptions::default(),
    );

    let record = store
        .load("store", LoadState::Loaded, None)
        .expect("load store");
    let store_id = id_of(&Value::Object(record.clone()));

    let sellers = record
        .get("top_sellers")
        .and_then(Value::as_array)
        .expect("top sellers built");
    assert_eq!(sellers.len(), 3);
    assert_eq!(store.owned_by("store", &store_id).len(), 5);
    assert_eq!(store.identity_count("product"), 5);

    for seller in sellers {
        let product_id = id_of(seller);
        assert_eq!(
            store.owner_of("product", &product_id),
            Some(&ObjectKey::new("store", store_id.clone()))
        );
        assert_eq!(
            seller.get("store"),
            Some(&serde_json::json!({
                "id": store_id.as_str(),
                "name": record.get("name").cloned().expect("store name built"),
            }))
        );
    }
}

#[test]
fn unreturned_children_stay_fetchable() {
    let mut store = shop(CountRange::exactly(5.0), None, StoreOptions::default());
    let record = store
        .load("store", LoadState::Loaded, None)
        .expect("load store");
    let store_id = id_of(&Value::Object(record));

    let children: Vec<String> = store
        .owned_by("store", &store_id)
        .iter()
        .map(|child| child.id.clone())
        .collect();
    let last = children.last().expect("store owns products");
    assert_eq!(store.state_of("product", last), Some(LoadState::Identifier));

    let product = store.fetch_by_id("product", last).expect("fetch owned product");
    assert!(product.contains_key("price"));
    assert_eq!(store.owned_by("store", &store_id).len(), 5);
}

#[test]
fn small_owned_set_truncates_sample() {
    let mut store = shop(
        CountRange::exactly(2.0),
        Some(Transform::pick(["id"])),
        StoreOptions::default(),
    );
    let record = store
        .load("store", LoadState::Loaded, None)
        .expect("load store");

    let sellers = record
        .get("top_sellers")
        .and_then(Value::as_array)
        .expect("top sellers built");
    assert_eq!(sellers.len(), 2);
}

#[test]
fn orphan_product_gets_a_new_owner() {
    let mut store = shop(
        CountRange::exactly(5.0),
        Some(Transform::pick(["id", "name"])),
        StoreOptions::default(),
    );

    let product = store
        .load("product", LoadState::Loaded, None)
        .expect("load product");
    let product_id = id_of(&Value::Object(product.clone()));
    let owner = store
        .owner_of("product", &product_id)
        .cloned()
        .expect("product linked to an owner");

    assert_eq!(owner.model, "store");
    assert_eq!(
        product.get("store").and_then(|owner| owner.get("id")),
        Some(&Value::String(owner.id.clone()))
    );
    assert_eq!(store.state_of("store", &owner.id), Some(LoadState::Identifier));
    assert_eq!(store.owned_by("store", &owner.id).len(), 1);
}

#[test]
fn full_owner_load_terminates_on_reentry() {
    let mut store = shop(CountRange::exactly(5.0), None, StoreOptions::default());

    let product = store
        .load("product", LoadState::Loaded, None)
        .expect("load product");
    let owner = product
        .get("store")
        .and_then(Value::as_object)
        .expect("owner embedded");

    let owner_id = owner
        .get("id")
        .and_then(Value::as_str)
        .expect("owner id");
    assert_eq!(store.state_of("store", owner_id), Some(LoadState::Loaded));
    assert_eq!(store.owned_by("store", owner_id).len(), 6);
}

#[test]
fn depth_limit_aborts_nested_loads() {
    let mut store = shop(
        CountRange::exactly(5.0),
        Some(Transform::pick(["id", "name"])),
        StoreOptions {
            max_load_depth: 1,
            ..StoreOptions::default()
        },
    );

    let err = store
        .load("product", LoadState::Loaded, None)
        .expect_err("owner lookup needs a second level");
    assert!(matches!(
        err.root_cause(),
        GenerationError::DepthExceeded { limit: 1, .. }
    ));
}

#[test]
fn owner_pick_of_set_under_construction_reads_null() {
    let mut registry = ModelRegistry::new();
    registry
        .add_model(
            "product",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                (
                    "store",
                    FieldSpec::owner("store", Some(Transform::pick(["id", "products"]))),
                ),
            ],
            ModelOptions::default(),
        )
        .expect("register product")
        .add_model(
            "store",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                (
                    "products",
                    FieldSpec::owned_set_of("product", Some(CountRange::exactly(1.0)), None),
                ),
            ],
            ModelOptions::default().with_owns("product", CountRange::exactly(2.0)),
        )
        .expect("register store");
    let catalog = registry.realize().expect("shop realizes");
    let mut store = ObjectStore::new(Arc::new(catalog), StoreOptions::default());

    let record = store
        .load("store", LoadState::Loaded, None)
        .expect("load store");
    let store_id = id_of(&Value::Object(record.clone()));

    assert_eq!(store.identity_count("product"), 2);
    assert_eq!(store.owned_by("store", &store_id).len(), 2);

    let products = record
        .get("products")
        .and_then(Value::as_array)
        .expect("products built");
    assert_eq!(products.len(), 1);
    assert_eq!(
        products[0].get("store"),
        Some(&serde_json::json!({ "id": store_id.as_str(), "products": null }))
    );
}
