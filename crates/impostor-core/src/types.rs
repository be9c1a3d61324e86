use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Resolved semantic types, per model and field.
///
/// The table only grows: once a field has a type it is never recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedTypes {
    models: BTreeMap<String, BTreeMap<String, String>>,
}

impl ResolvedTypes {
    /// Seed an empty entry for every registered model so derived types can
    /// tell a registered model from an unknown one.
    pub fn with_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models
                .into_iter()
                .map(|name| (name.into(), BTreeMap::new()))
                .collect(),
        }
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn get(&self, model: &str, field: &str) -> Option<&str> {
        self.models
            .get(model)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn model(&self, model: &str) -> Option<&BTreeMap<String, String>> {
        self.models.get(model)
    }

    /// Number of resolved fields for `model`.
    pub fn resolved_count(&self, model: &str) -> usize {
        self.models.get(model).map(BTreeMap::len).unwrap_or(0)
    }

    /// Record a resolved type. Returns `false` when the field already had one.
    pub fn insert(&mut self, model: &str, field: &str, ty: String) -> bool {
        let fields = self.models.entry(model.to_string()).or_default();
        if fields.contains_key(field) {
            return false;
        }
        fields.insert(field.to_string(), ty);
        true
    }
}

/// A type that cannot be computed yet because something it reads is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub model: String,
    pub field: Option<String>,
}

impl Pending {
    pub fn model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            field: None,
        }
    }

    pub fn field(model: &str, field: &str) -> Self {
        Self {
            model: model.to_string(),
            field: Some(field.to_string()),
        }
    }
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.model, field),
            None => write!(f, "model {}", self.model),
        }
    }
}

/// Named object type derived from a model's `preview` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewType {
    pub name: String,
    pub model: String,
    pub definition: String,
}

/// Type name for a model: the model name with its first letter upper-cased.
pub fn type_name(model: &str) -> String {
    let mut chars = model.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Inline object type `{ a: T; b: U }`.
pub(crate) fn object_type<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let members: Vec<String> = members
        .into_iter()
        .map(|(name, ty)| format!("{name}: {ty}"))
        .collect();
    format!("{{ {} }}", members.join("; "))
}
