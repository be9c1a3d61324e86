use impostor_core::{
    CountRange, FieldSpec, IdKind, ModelOptions, ModelRegistry, SchemaError, Transform,
};

/// Register the bundled demo models: a stock ticker and a small shop.
pub fn register_demo_models(registry: &mut ModelRegistry) -> Result<(), SchemaError> {
    registry.add_model(
        "stock",
        [
            ("id", FieldSpec::unique(IdKind::String)),
            ("name", FieldSpec::words(CountRange::new(2.0, 5.0))),
            ("description", FieldSpec::paragraph()),
            (
                "latestTradingDay",
                FieldSpec::curve(450, 0.001, CountRange::new(5.0, 1000.0)),
            ),
        ],
        ModelOptions::default().with_preview(["name", "description", "latestTradingDay"]),
    )?;

    registry
        .add_model(
            "image",
            [
                ("id", FieldSpec::unique(IdKind::Number)),
                ("name", FieldSpec::words(CountRange::new(1.0, 3.0))),
                (
                    "url",
                    FieldSpec::template("name", "https://picsum.photos/seed/{}/640/480"),
                ),
            ],
            ModelOptions::default().with_preview(["url"]),
        )?
        .add_model(
            "category",
            [
                ("id", FieldSpec::unique(IdKind::Number)),
                ("name", FieldSpec::word()),
            ],
            ModelOptions::default().with_preview(["name"]),
        )?
        .add_model(
            "product",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                ("name", FieldSpec::words(CountRange::new(1.0, 4.0))),
                ("price", FieldSpec::currency(CountRange::new(1.0, 500.0))),
                ("description", FieldSpec::paragraph()),
                (
                    "images",
                    FieldSpec::set_of(
                        "image",
                        Some(CountRange::new(1.0, 4.0)),
                        Some(Transform::pick(["url", "name"])),
                    ),
                ),
                (
                    "store",
                    FieldSpec::owner("store", Some(Transform::pick(["id", "name"]))),
                ),
            ],
            ModelOptions::default().with_preview(["name", "images"]),
        )?
        .add_model(
            "store",
            [
                ("id", FieldSpec::unique(IdKind::String)),
                ("name", FieldSpec::words(CountRange::new(1.0, 3.0))),
                ("store_address", FieldSpec::address()),
                (
                    "categories",
                    FieldSpec::set_of(
                        "category",
                        Some(CountRange::new(1.0, 4.0)),
                        Some(Transform::pick(["id", "name"])),
                    ),
                ),
                (
                    "top_sellers",
                    FieldSpec::owned_set_of(
                        "product",
                        Some(CountRange::exactly(3.0)),
                        Some(Transform::pick(["id", "name", "price"])),
                    ),
                ),
            ],
            ModelOptions::default()
                .with_preview(["name"])
                .with_owns("product", CountRange::new(5.0, 10.0)),
        )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_models_realize() {
        let mut registry = ModelRegistry::new();
        register_demo_models(&mut registry).expect("register demo models");
        let catalog = registry.realize().expect("demo models realize");

        assert_eq!(
            catalog.model_names(),
            vec!["stock", "image", "category", "product", "store"]
        );
        assert_eq!(
            catalog.types().get("store", "top_sellers"),
            Some("{ id: string; name: string; price: number }[]")
        );
        assert_eq!(catalog.relationships().owner_model("product"), Some("store"));
        assert!(
            catalog
                .render_type_definitions()
                .contains("type ProductPreview = {")
        );
    }
}
