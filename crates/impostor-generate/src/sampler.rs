use impostor_core::{CountRange, Record, Relationship};
use tracing::debug;

use crate::errors::GenerationError;
use crate::ownership::ObjectKey;
use crate::store::{LoadState, ObjectStore, record_key};
use crate::values;

impl ObjectStore {
    /// Produce related records of `model` for a `set_of` field on `owner`.
    ///
    /// Unrelated sampling loads fresh records. Owned sampling mints the
    /// owner's full set of children first, links each of them, and returns
    /// the leading `sample_count` of that set. When the set is smaller than
    /// the sample count the result is shorter.
    pub fn sample(
        &mut self,
        model: &str,
        owner: &Record,
        count_range: Option<CountRange>,
        relationship: Relationship,
    ) -> Result<Vec<Record>, GenerationError> {
        let catalog = self.catalog_arc();
        let template = catalog
            .template(model)
            .ok_or_else(|| GenerationError::UnknownModel(model.to_string()))?;

        let range = count_range.unwrap_or(self.options().default_sample_range);
        let sample_count = values::count_within(&mut self.rng, range);

        match relationship {
            Relationship::Unrelated => (0..sample_count)
                .map(|_| self.load(model, LoadState::Loaded, None))
                .collect(),
            Relationship::Owned => {
                let owner_model = catalog
                    .relationships()
                    .owner_model(model)
                    .ok_or_else(|| GenerationError::MissingRelationship(model.to_string()))?;
                let owns_range = catalog
                    .template(owner_model)
                    .and_then(|owner_template| owner_template.options.owns.as_ref())
                    .map(|owns| owns.count_range)
                    .ok_or_else(|| GenerationError::MissingRelationship(model.to_string()))?;
                let parent = ObjectKey::new(owner_model, record_key(owner_model, owner)?);

                let owned_count = values::count_within(&mut self.rng, owns_range);
                let mut children = Vec::with_capacity(owned_count);
                for _ in 0..owned_count {
                    let child = self.mint_identity(template)?;
                    self.link(parent.clone(), ObjectKey::new(model, child.clone()));
                    children.push(child);
                }
                debug!(
                    owner = %parent.model,
                    owner_id = %parent.id,
                    model = %model,
                    owned = owned_count,
                    sampled = sample_count.min(owned_count),
                    "owned set minted"
                );

                children
                    .iter()
                    .take(sample_count)
                    .map(|child| self.load(model, LoadState::Loaded, Some(child.as_str())))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use impostor_core::{FieldSpec, IdKind, ModelOptions, ModelRegistry};
    use serde_json::Value;

    use super::*;
    use crate::options::StoreOptions;

    fn tag_store() -> ObjectStore {
        let mut registry = ModelRegistry::new();
        registry
            .add_model(
                "tag",
                [
                    ("id", FieldSpec::unique(IdKind::Number)),
                    ("label", FieldSpec::word()),
                ],
                ModelOptions::default(),
            )
            .expect("add tag");
        let catalog = registry.realize().expect("realize");
        ObjectStore::new(Arc::new(catalog), StoreOptions::default())
    }

    #[test]
    fn unrelated_sample_loads_fresh_records() {
        let mut store = tag_store();
        let sampled = store
            .sample(
                "tag",
                &Record::new(),
                Some(CountRange::exactly(4.0)),
                Relationship::Unrelated,
            )
            .expect("sample tags");

        assert_eq!(sampled.len(), 4);
        assert!(sampled.iter().all(|tag| tag.get("label").is_some_and(Value::is_string)));
        assert_eq!(store.identity_count("tag"), 4);
    }

    #[test]
    fn default_range_applies_without_count_range() {
        let mut store = tag_store();
        let sampled = store
            .sample("tag", &Record::new(), None, Relationship::Unrelated)
            .expect("sample tags");
        assert_eq!(sampled.len(), 3);
    }

    #[test]
    fn owned_sample_without_owner_fails() {
        let mut store = tag_store();
        let err = store
            .sample("tag", &Record::new(), None, Relationship::Owned)
            .expect_err("tag has no owner");
        assert!(matches!(err, GenerationError::MissingRelationship(model) if model == "tag"));
    }
}
