use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Record;
use crate::types::{Pending, ResolvedTypes, object_type, type_name};

/// Dependency key naming the model that declares the field.
pub const SELF_MODEL: &str = "self";

/// Uniform float range `[min, max]`, floored by the callers that need counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CountRange(pub f64, pub f64);

impl CountRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self(min, max)
    }

    /// Degenerate range that always yields `value`.
    pub const fn exactly(value: f64) -> Self {
        Self(value, value)
    }

    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 <= self.1
    }

    fn one() -> Self {
        Self::exactly(1.0)
    }

    fn currency() -> Self {
        Self(0.0, 1000.0)
    }
}

/// Representation of a minted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    String,
    Number,
}

impl IdKind {
    pub fn semantic_type(&self) -> &'static str {
        match self {
            IdKind::String => "string",
            IdKind::Number => "number",
        }
    }
}

/// How a `set_of` field relates to the model it samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Fresh records with no identity reuse.
    #[default]
    Unrelated,
    /// Children owned by the record being built.
    Owned,
}

/// Projection applied to a related record before it is stored on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Keep exactly the listed keys.
    Pick { keys: Vec<String> },
}

impl Transform {
    pub fn pick<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Transform::Pick {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields of the related model this transform reads.
    pub fn depends_on(&self) -> DependsOn {
        match self {
            Transform::Pick { keys } => DependsOn::Fields(keys.clone()),
        }
    }

    /// Project a related record. Keys absent from the record become `null`.
    pub fn apply(&self, record: &Record) -> Value {
        match self {
            Transform::Pick { keys } => {
                let mut projected = Record::new();
                for key in keys {
                    let value = record.get(key).cloned().unwrap_or(Value::Null);
                    projected.insert(key.clone(), value);
                }
                Value::Object(projected)
            }
        }
    }

    /// Type of the projected record, pending until every key is resolved.
    pub fn resulting_type(&self, model: &str, types: &ResolvedTypes) -> Result<String, Pending> {
        match self {
            Transform::Pick { keys } => {
                let mut members = Vec::with_capacity(keys.len());
                for key in keys {
                    let ty = types
                        .get(model, key)
                        .ok_or_else(|| Pending::field(model, key))?;
                    members.push((key.as_str(), ty));
                }
                Ok(object_type(members))
            }
        }
    }
}

/// Which fields of a model a field depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependsOn {
    Fields(Vec<String>),
    Full,
}

/// Declared dependencies of a field keyed by model name or [`SELF_MODEL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies(BTreeMap<String, DependsOn>);

impl Dependencies {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on(model: impl Into<String>, depends_on: DependsOn) -> Self {
        let mut deps = BTreeMap::new();
        deps.insert(model.into(), depends_on);
        Self(deps)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, model: &str) -> Option<&DependsOn> {
        self.0.get(model)
    }

    /// Sibling fields that must be materialized before this one.
    pub fn self_fields(&self) -> &[String] {
        match self.0.get(SELF_MODEL) {
            Some(DependsOn::Fields(fields)) => fields,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DependsOn)> {
        self.0.iter().map(|(model, deps)| (model.as_str(), deps))
    }
}

/// Closed set of value-building strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// UUID or per-field counter.
    Unique { id_type: IdKind },
    /// Lorem words, count drawn from `count_range`.
    Words {
        #[serde(default = "CountRange::one")]
        count_range: CountRange,
    },
    Paragraph,
    Address,
    /// Uniform amount in `range`, rounded to cents.
    Currency {
        #[serde(default = "CountRange::currency")]
        range: CountRange,
    },
    /// Random walk of `num_of_points` values.
    Curve {
        num_of_points: usize,
        variation_range: f64,
        initial_range: CountRange,
    },
    /// `pattern` with `{}` replaced by the value of `source`.
    Template { source: String, pattern: String },
    /// The record owning this one.
    Owner {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
    },
    /// A sampled list of related records.
    SetOf {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count_range: Option<CountRange>,
        #[serde(default)]
        relationship: Relationship,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
    },
}

/// Specification of a single field: its kind plus everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
}

impl From<FieldKind> for FieldSpec {
    fn from(kind: FieldKind) -> Self {
        Self { kind }
    }
}

impl FieldSpec {
    pub fn unique(id_type: IdKind) -> Self {
        FieldKind::Unique { id_type }.into()
    }

    pub fn words(count_range: CountRange) -> Self {
        FieldKind::Words { count_range }.into()
    }

    pub fn word() -> Self {
        Self::words(CountRange::one())
    }

    pub fn paragraph() -> Self {
        FieldKind::Paragraph.into()
    }

    pub fn address() -> Self {
        FieldKind::Address.into()
    }

    pub fn currency(range: CountRange) -> Self {
        FieldKind::Currency { range }.into()
    }

    pub fn curve(num_of_points: usize, variation_range: f64, initial_range: CountRange) -> Self {
        FieldKind::Curve {
            num_of_points,
            variation_range,
            initial_range,
        }
        .into()
    }

    pub fn template(source: impl Into<String>, pattern: impl Into<String>) -> Self {
        FieldKind::Template {
            source: source.into(),
            pattern: pattern.into(),
        }
        .into()
    }

    pub fn owner(model: impl Into<String>, transform: Option<Transform>) -> Self {
        FieldKind::Owner {
            model: model.into(),
            transform,
        }
        .into()
    }

    pub fn set_of(
        model: impl Into<String>,
        count_range: Option<CountRange>,
        transform: Option<Transform>,
    ) -> Self {
        FieldKind::SetOf {
            model: model.into(),
            count_range,
            relationship: Relationship::Unrelated,
            transform,
        }
        .into()
    }

    pub fn owned_set_of(
        model: impl Into<String>,
        count_range: Option<CountRange>,
        transform: Option<Transform>,
    ) -> Self {
        FieldKind::SetOf {
            model: model.into(),
            count_range,
            relationship: Relationship::Owned,
            transform,
        }
        .into()
    }

    /// Attempt to compute the semantic type against the current table.
    pub fn semantic_type(&self, types: &ResolvedTypes) -> Result<String, Pending> {
        match &self.kind {
            FieldKind::Unique { id_type } => Ok(id_type.semantic_type().to_string()),
            FieldKind::Words { .. }
            | FieldKind::Paragraph
            | FieldKind::Address
            | FieldKind::Template { .. } => Ok("string".to_string()),
            FieldKind::Currency { .. } => Ok("number".to_string()),
            FieldKind::Curve { .. } => Ok("number[]".to_string()),
            FieldKind::Owner { model, transform } => {
                derive_type(model, transform.as_ref(), types)
            }
            FieldKind::SetOf {
                model, transform, ..
            } => derive_type(model, transform.as_ref(), types).map(|ty| format!("{ty}[]")),
        }
    }

    pub fn dependencies(&self) -> Dependencies {
        match &self.kind {
            FieldKind::Template { source, .. } => {
                Dependencies::on(SELF_MODEL, DependsOn::Fields(vec![source.clone()]))
            }
            FieldKind::Owner { model, transform } | FieldKind::SetOf { model, transform, .. } => {
                Dependencies::on(
                    model.clone(),
                    transform
                        .as_ref()
                        .map(Transform::depends_on)
                        .unwrap_or(DependsOn::Full),
                )
            }
            _ => Dependencies::none(),
        }
    }

    /// Ranges carried by the kind, for validation.
    pub(crate) fn ranges(&self) -> Vec<CountRange> {
        match &self.kind {
            FieldKind::Words { count_range } => vec![*count_range],
            FieldKind::Currency { range } => vec![*range],
            FieldKind::Curve { initial_range, .. } => vec![*initial_range],
            FieldKind::SetOf {
                count_range: Some(range),
                ..
            } => vec![*range],
            _ => Vec::new(),
        }
    }
}

fn derive_type(
    model: &str,
    transform: Option<&Transform>,
    types: &ResolvedTypes,
) -> Result<String, Pending> {
    match transform {
        Some(transform) => transform.resulting_type(model, types),
        None if types.has_model(model) => Ok(type_name(model)),
        None => Err(Pending::model(model)),
    }
}
