use std::collections::HashMap;
use std::sync::Arc;

use impostor_core::{
    Catalog, DependsOn, FieldKind, ID_FIELD, IdKind, ModelTemplate, Record, Transform,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::GenerationError;
use crate::options::StoreOptions;
use crate::ownership::{ObjectKey, OwnershipLedger};
use crate::values;

/// Materialization state of a cached record. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Only `id` is present.
    Identifier,
    /// `id` plus the model's preview fields.
    Preview,
    /// Every declared field.
    Loaded,
}

/// A cached record plus its materialization state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedObject {
    state: LoadState,
    value: Record,
}

impl LoadedObject {
    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn value(&self) -> &Record {
        &self.value
    }
}

/// Read request accepted by [`ObjectStore::get_model`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchOptions {
    Id { id: String },
    Index { skip_first: usize, count: usize },
}

impl FetchOptions {
    pub fn id(id: impl Into<String>) -> Self {
        FetchOptions::Id { id: id.into() }
    }

    /// Zero-based page of `size` records.
    pub fn page(page: usize, size: usize) -> Self {
        FetchOptions::Index {
            skip_first: page.saturating_mul(size),
            count: size,
        }
    }
}

#[derive(Debug, Default)]
struct ModelObjects {
    /// Id keys in the order identities were minted.
    order: Vec<String>,
    entries: HashMap<String, LoadedObject>,
}

/// Lazy-loading cache of generated records.
///
/// Identities are minted once and kept for the life of the store; fields are
/// built only when a requested state needs them. Access is single-threaded:
/// wrap the store in a mutex when serving concurrent requests.
#[derive(Debug)]
pub struct ObjectStore {
    catalog: Arc<Catalog>,
    options: StoreOptions,
    objects: HashMap<String, ModelObjects>,
    ledger: OwnershipLedger,
    counters: HashMap<String, u64>,
    in_flight: Vec<ObjectKey>,
    /// Fields whose builders are running, innermost last.
    building: Vec<(ObjectKey, String)>,
    pub(crate) rng: ChaCha8Rng,
}

impl ObjectStore {
    pub fn new(catalog: Arc<Catalog>, options: StoreOptions) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(options.seed);
        Self {
            catalog,
            options,
            objects: HashMap::new(),
            ledger: OwnershipLedger::new(),
            counters: HashMap::new(),
            in_flight: Vec::new(),
            building: Vec::new(),
            rng,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn catalog_arc(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Registered model names, one route pair per model for a server.
    pub fn model_names(&self) -> Vec<String> {
        self.catalog
            .model_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Return a record in at least `state`, minting an identity when `id`
    /// is omitted and building only the fields that are still missing.
    pub fn load(
        &mut self,
        model: &str,
        state: LoadState,
        id: Option<&str>,
    ) -> Result<Record, GenerationError> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .template(model)
            .ok_or_else(|| GenerationError::UnknownModel(model.to_string()))?;

        let key = match id {
            Some(id) => self.ensure_identity(template, id)?,
            None => self.mint_identity(template)?,
        };
        self.upgrade(template, &key, state)?;

        Ok(self.record(model, &key).cloned().unwrap_or_default())
    }

    /// Fetch a minted record, fully loaded.
    pub fn fetch_by_id(&mut self, model: &str, id: &str) -> Result<Record, GenerationError> {
        if self.catalog.template(model).is_none() {
            return Err(GenerationError::UnknownModel(model.to_string()));
        }
        if self.object(model, id).is_none() {
            return Err(GenerationError::NotFound {
                model: model.to_string(),
                id: id.to_string(),
            });
        }
        self.load(model, LoadState::Loaded, Some(id))
    }

    /// Fetch `count` previews starting at `skip_first`, in creation order,
    /// minting identities until the window exists. Minting stops at the
    /// model's `max_count`, or at `max_identities` when the model has none.
    pub fn fetch_page(
        &mut self,
        model: &str,
        skip_first: usize,
        count: usize,
    ) -> Result<Vec<Record>, GenerationError> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .template(model)
            .ok_or_else(|| GenerationError::UnknownModel(model.to_string()))?;

        let wanted = skip_first.saturating_add(count);
        let cap = template
            .options
            .max_count
            .unwrap_or(self.options.max_identities);
        let target = wanted.min(cap);
        while self.identity_count(model) < target {
            self.load(model, LoadState::Identifier, None)?;
        }

        let keys: Vec<String> = self
            .identities(model)
            .into_iter()
            .skip(skip_first)
            .take(count)
            .map(str::to_string)
            .collect();

        keys.iter()
            .map(|key| self.load(model, LoadState::Preview, Some(key.as_str())))
            .collect()
    }

    /// External read API: a single record or a page, as JSON.
    pub fn get_model(
        &mut self,
        model: &str,
        options: &FetchOptions,
    ) -> Result<Value, GenerationError> {
        match options {
            FetchOptions::Id { id } => self.fetch_by_id(model, id).map(Value::Object),
            FetchOptions::Index { skip_first, count } => {
                let page = self.fetch_page(model, *skip_first, *count)?;
                Ok(Value::Array(page.into_iter().map(Value::Object).collect()))
            }
        }
    }

    pub fn object(&self, model: &str, id: &str) -> Option<&LoadedObject> {
        self.objects.get(model)?.entries.get(id)
    }

    pub fn state_of(&self, model: &str, id: &str) -> Option<LoadState> {
        self.object(model, id).map(LoadedObject::state)
    }

    /// Id keys of `model` in creation order.
    pub fn identities(&self, model: &str) -> Vec<&str> {
        self.objects
            .get(model)
            .map(|objects| objects.order.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn identity_count(&self, model: &str) -> usize {
        self.objects
            .get(model)
            .map(|objects| objects.order.len())
            .unwrap_or(0)
    }

    pub fn owner_of(&self, model: &str, id: &str) -> Option<&ObjectKey> {
        self.ledger.owner_of(&ObjectKey::new(model, id))
    }

    pub fn owned_by(&self, model: &str, id: &str) -> &[ObjectKey] {
        self.ledger.owned_by(&ObjectKey::new(model, id))
    }

    pub fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }

    pub(crate) fn link(&mut self, parent: ObjectKey, child: ObjectKey) -> bool {
        self.ledger.link(parent, child)
    }

    fn record(&self, model: &str, key: &str) -> Option<&Record> {
        self.object(model, key).map(LoadedObject::value)
    }

    fn has_field(&self, model: &str, key: &str, field: &str) -> bool {
        self.record(model, key)
            .is_some_and(|record| record.contains_key(field))
    }

    /// Mint a fresh identity for `template` and cache it in `Identifier` state.
    pub(crate) fn mint_identity(
        &mut self,
        template: &ModelTemplate,
    ) -> Result<String, GenerationError> {
        let (id, key) = loop {
            let candidate = self.next_unique(&template.name, ID_FIELD, template.id_kind());
            let key = value_key(&candidate)
                .ok_or_else(|| GenerationError::MissingIdentity(template.name.clone()))?;
            if self.object(&template.name, &key).is_none() {
                break (candidate, key);
            }
        };
        self.insert_identity(&template.name, &key, id);
        debug!(model = %template.name, id = %key, "identity minted");
        Ok(key)
    }

    /// Make sure a caller-supplied id has a cache entry.
    fn ensure_identity(
        &mut self,
        template: &ModelTemplate,
        id: &str,
    ) -> Result<String, GenerationError> {
        if self.object(&template.name, id).is_some() {
            return Ok(id.to_string());
        }

        let value = match template.id_kind() {
            IdKind::String => Value::String(id.to_string()),
            IdKind::Number => id.parse::<u64>().map(Value::from).map_err(|_| {
                GenerationError::InvalidId {
                    model: template.name.clone(),
                    id: id.to_string(),
                }
            })?,
        };
        let key = value_key(&value).ok_or_else(|| GenerationError::InvalidId {
            model: template.name.clone(),
            id: id.to_string(),
        })?;
        self.insert_identity(&template.name, &key, value);
        Ok(key)
    }

    fn insert_identity(&mut self, model: &str, key: &str, id: Value) {
        let mut value = Record::new();
        value.insert(ID_FIELD.to_string(), id);

        let objects = self.objects.entry(model.to_string()).or_default();
        objects.order.push(key.to_string());
        objects.entries.insert(
            key.to_string(),
            LoadedObject {
                state: LoadState::Identifier,
                value,
            },
        );
    }

    fn next_unique(&mut self, model: &str, field: &str, id_type: IdKind) -> Value {
        match id_type {
            IdKind::String => Value::String(values::uuid_v4(&mut self.rng)),
            IdKind::Number => {
                let counter = self.counters.entry(format!("{model}.{field}")).or_insert(0);
                let value = *counter;
                *counter += 1;
                Value::from(value)
            }
        }
    }

    /// Bring a cached record up to `state`.
    fn upgrade(
        &mut self,
        template: &ModelTemplate,
        key: &str,
        state: LoadState,
    ) -> Result<(), GenerationError> {
        let current = self
            .state_of(&template.name, key)
            .unwrap_or(LoadState::Identifier);
        if current >= state {
            return Ok(());
        }

        let completed = self.guarded(&template.name, key, |store| {
            let fields: Vec<&str> = match state {
                LoadState::Identifier => vec![ID_FIELD],
                LoadState::Preview => std::iter::once(ID_FIELD)
                    .chain(
                        template
                            .preview_fields()
                            .iter()
                            .map(String::as_str)
                            .filter(|field| *field != ID_FIELD),
                    )
                    .collect(),
                LoadState::Loaded => template.field_names().collect(),
            };
            store.build_fields(template, key, &fields)
        })?;

        if completed
            && let Some(object) = self
                .objects
                .get_mut(&template.name)
                .and_then(|objects| objects.entries.get_mut(key))
            && object.state < state
        {
            object.state = state;
            debug!(model = %template.name, id = %key, state = ?state, "record upgraded");
        }

        Ok(())
    }

    /// Build specific fields of a record without changing its state. Fields
    /// still under construction higher up the stack are left missing.
    pub(crate) fn ensure_fields(
        &mut self,
        template: &ModelTemplate,
        key: &str,
        fields: &[&str],
    ) -> Result<(), GenerationError> {
        let missing: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|field| template.field(field).is_some())
            .filter(|field| !self.has_field(&template.name, key, field))
            .filter(|field| !self.is_building(&template.name, key, field))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        self.nested(&template.name, key, |store| {
            store.build_fields(template, key, &missing)
        })
    }

    /// Whether `field` of the record is being built further up the stack.
    fn is_building(&self, model: &str, key: &str, field: &str) -> bool {
        self.building
            .iter()
            .any(|(object, name)| object.model == model && object.id == key && name == field)
    }

    /// Run `work` with the record marked as materializing. A record that is
    /// already materializing higher up the stack is left as is and `false`
    /// is returned.
    fn guarded<F>(&mut self, model: &str, key: &str, work: F) -> Result<bool, GenerationError>
    where
        F: FnOnce(&mut Self) -> Result<(), GenerationError>,
    {
        if self.in_flight.contains(&ObjectKey::new(model, key)) {
            return Ok(false);
        }
        self.nested(model, key, work).map(|_| true)
    }

    /// Run `work` one level deeper in the load stack.
    fn nested<F>(&mut self, model: &str, key: &str, work: F) -> Result<(), GenerationError>
    where
        F: FnOnce(&mut Self) -> Result<(), GenerationError>,
    {
        if self.in_flight.len() >= self.options.max_load_depth {
            return Err(GenerationError::DepthExceeded {
                model: model.to_string(),
                limit: self.options.max_load_depth,
            });
        }

        self.in_flight.push(ObjectKey::new(model, key));
        let result = work(self);
        self.in_flight.pop();
        result
    }

    fn build_fields(
        &mut self,
        template: &ModelTemplate,
        key: &str,
        fields: &[&str],
    ) -> Result<(), GenerationError> {
        let mut visiting = Vec::new();
        for field in fields {
            self.build_field(template, key, field, &mut visiting)?;
        }
        Ok(())
    }

    /// Build one field after its sibling dependencies, committing the value
    /// to the cache before returning.
    fn build_field<'t>(
        &mut self,
        template: &'t ModelTemplate,
        key: &str,
        field: &'t str,
        visiting: &mut Vec<&'t str>,
    ) -> Result<(), GenerationError> {
        if self.has_field(&template.name, key, field)
            || self.is_building(&template.name, key, field)
        {
            return Ok(());
        }
        if visiting.contains(&field) {
            return Err(GenerationError::DependencyCycle {
                model: template.name.clone(),
                field: field.to_string(),
            });
        }
        let spec = template
            .field(field)
            .ok_or_else(|| GenerationError::MissingInput {
                model: template.name.clone(),
                field: field.to_string(),
                input: field.to_string(),
            })?;

        let dependencies = spec.dependencies();
        visiting.push(field);
        for dependency in template
            .field_names()
            .filter(|name| dependencies.self_fields().iter().any(|input| input == name))
        {
            self.build_field(template, key, dependency, visiting)?;
        }
        visiting.pop();

        let record = self.record(&template.name, key).cloned().unwrap_or_default();
        self.building
            .push((ObjectKey::new(&template.name, key), field.to_string()));
        let built = self.build_value(template, field, &spec.kind, &record);
        self.building.pop();
        let value = match built {
            Ok(value) => value,
            Err(err) => {
                if !err.is_builder_failure() {
                    error!(
                        model = %template.name,
                        field = %field,
                        id = %key,
                        error = %err,
                        "field builder failed"
                    );
                }
                return Err(GenerationError::Builder {
                    model: template.name.clone(),
                    field: field.to_string(),
                    source: Box::new(err),
                });
            }
        };

        if let Some(object) = self
            .objects
            .get_mut(&template.name)
            .and_then(|objects| objects.entries.get_mut(key))
        {
            object.value.insert(field.to_string(), value);
        }
        Ok(())
    }

    fn build_value(
        &mut self,
        template: &ModelTemplate,
        field: &str,
        kind: &FieldKind,
        record: &Record,
    ) -> Result<Value, GenerationError> {
        match kind {
            FieldKind::Unique { id_type } => Ok(self.next_unique(&template.name, field, *id_type)),
            FieldKind::Words { count_range } => {
                Ok(Value::String(values::words(&mut self.rng, *count_range)))
            }
            FieldKind::Paragraph => Ok(Value::String(values::paragraph(&mut self.rng))),
            FieldKind::Address => Ok(Value::String(values::address(&mut self.rng))),
            FieldKind::Currency { range } => Ok(Value::from(values::currency(&mut self.rng, *range))),
            FieldKind::Curve {
                num_of_points,
                variation_range,
                initial_range,
            } => {
                let points =
                    values::curve(&mut self.rng, *num_of_points, *variation_range, *initial_range);
                Ok(Value::Array(points.into_iter().map(Value::from).collect()))
            }
            FieldKind::Template { source, pattern } => {
                let input = record
                    .get(source)
                    .ok_or_else(|| GenerationError::MissingInput {
                        model: template.name.clone(),
                        field: field.to_string(),
                        input: source.clone(),
                    })?;
                Ok(Value::String(values::fill_template(pattern, input)))
            }
            FieldKind::Owner { model, transform } => {
                let owner = self.resolve_owner(template, record, model, transform.as_ref())?;
                Ok(project(transform.as_ref(), &owner))
            }
            FieldKind::SetOf {
                model,
                count_range,
                relationship,
                transform,
            } => {
                let sampled = self.sample(model, record, *count_range, *relationship)?;
                Ok(Value::Array(
                    sampled
                        .iter()
                        .map(|related| project(transform.as_ref(), related))
                        .collect(),
                ))
            }
        }
    }

    /// Find (or mint and link) the owner of `record`, then materialize what
    /// the owner field's transform reads.
    fn resolve_owner(
        &mut self,
        template: &ModelTemplate,
        record: &Record,
        owner_model: &str,
        transform: Option<&Transform>,
    ) -> Result<Record, GenerationError> {
        let catalog = Arc::clone(&self.catalog);
        let owner_template = catalog
            .template(owner_model)
            .ok_or_else(|| GenerationError::UnknownModel(owner_model.to_string()))?;
        let child = ObjectKey::new(&template.name, record_key(&template.name, record)?);

        let existing = self
            .ledger
            .owner_of(&child)
            .filter(|owner| owner.model == owner_model)
            .map(|owner| owner.id.clone());
        let owner_key = match existing {
            Some(key) => key,
            None => {
                let key = self.mint_identity(owner_template)?;
                self.link(ObjectKey::new(owner_model, key.clone()), child);
                key
            }
        };

        match transform.map(Transform::depends_on) {
            Some(DependsOn::Fields(fields)) => {
                let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
                self.ensure_fields(owner_template, &owner_key, &fields)?;
            }
            Some(DependsOn::Full) | None => {
                self.upgrade(owner_template, &owner_key, LoadState::Loaded)?;
            }
        }

        Ok(self
            .record(owner_model, &owner_key)
            .cloned()
            .unwrap_or_default())
    }
}

fn project(transform: Option<&Transform>, record: &Record) -> Value {
    match transform {
        Some(transform) => transform.apply(record),
        None => Value::Object(record.clone()),
    }
}

/// Cache key for an id value: strings as is, numbers in decimal.
pub(crate) fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn record_key(model: &str, record: &Record) -> Result<String, GenerationError> {
    record
        .get(ID_FIELD)
        .and_then(value_key)
        .ok_or_else(|| GenerationError::MissingIdentity(model.to_string()))
}
