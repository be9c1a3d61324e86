use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ID_FIELD;
use crate::error::SchemaError;
use crate::field::{CountRange, FieldKind, FieldSpec, IdKind};

/// One-to-many ownership edge declared on the owning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OwnsOptions {
    /// Owned model name.
    #[serde(rename = "type")]
    pub model: String,
    /// How many children are minted whenever the owner samples them.
    pub count_range: CountRange,
}

/// Optional behavior attached to a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelOptions {
    /// Fields exposed in paginated responses and in the preview type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preview: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owns: Option<OwnsOptions>,
    /// Upper bound on identities minted by pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

impl ModelOptions {
    pub fn with_preview<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preview = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_owns(mut self, model: impl Into<String>, count_range: CountRange) -> Self {
        self.owns = Some(OwnsOptions {
            model: model.into(),
            count_range,
        });
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }
}

/// A registered, immutable record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTemplate {
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, FieldSpec)>,
    pub options: ModelOptions,
}

impl ModelTemplate {
    pub(crate) fn new(
        name: String,
        fields: Vec<(String, FieldSpec)>,
        options: ModelOptions,
    ) -> Result<Self, SchemaError> {
        let template = Self {
            name,
            fields,
            options,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn preview_fields(&self) -> &[String] {
        &self.options.preview
    }

    /// Kind of identifier minted for this model.
    pub fn id_kind(&self) -> IdKind {
        match self.field(ID_FIELD).map(|spec| &spec.kind) {
            Some(FieldKind::Unique { id_type }) => *id_type,
            // validate() guarantees a unique id field
            _ => IdKind::String,
        }
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::invalid(&self.name, "model has no fields"));
        }

        let mut seen = BTreeSet::new();
        for (name, _) in &self.fields {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::invalid(
                    &self.name,
                    format!("field '{name}' declared twice"),
                ));
            }
        }

        match self.field(ID_FIELD).map(|spec| &spec.kind) {
            Some(FieldKind::Unique { .. }) => {}
            Some(_) => {
                return Err(SchemaError::invalid(
                    &self.name,
                    "field 'id' must be a unique field",
                ));
            }
            None => {
                return Err(SchemaError::invalid(&self.name, "missing 'id' field"));
            }
        }

        for preview in &self.options.preview {
            if !seen.contains(preview.as_str()) {
                return Err(SchemaError::invalid(
                    &self.name,
                    format!("preview field '{preview}' is not declared"),
                ));
            }
        }

        for (name, spec) in &self.fields {
            for dependency in spec.dependencies().self_fields() {
                if !seen.contains(dependency.as_str()) || dependency == name {
                    return Err(SchemaError::invalid(
                        &self.name,
                        format!("field '{name}' depends on unknown field '{dependency}'"),
                    ));
                }
            }
            if spec.ranges().iter().any(|range| !range.is_valid()) {
                return Err(SchemaError::invalid(
                    &self.name,
                    format!("field '{name}' has an invalid range"),
                ));
            }
        }

        if let Some(field) = self.self_dependency_cycle() {
            return Err(SchemaError::invalid(
                &self.name,
                format!("field '{field}' depends on itself through sibling fields"),
            ));
        }

        if let Some(owns) = &self.options.owns
            && !owns.count_range.is_valid()
        {
            return Err(SchemaError::invalid(
                &self.name,
                format!("owns '{}' has an invalid count range", owns.model),
            ));
        }

        Ok(())
    }

    /// First field found on a cycle of `self` dependencies, if any.
    fn self_dependency_cycle(&self) -> Option<&str> {
        let mut done = BTreeSet::new();
        for (name, _) in &self.fields {
            let mut path = Vec::new();
            if let Some(field) = self.walk_self_dependencies(name, &mut path, &mut done) {
                return Some(field);
            }
        }
        None
    }

    fn walk_self_dependencies<'a>(
        &'a self,
        field: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> Option<&'a str> {
        if done.contains(field) {
            return None;
        }
        if path.contains(&field) {
            return Some(field);
        }

        path.push(field);
        let dependencies = self
            .field(field)
            .map(|spec| spec.dependencies())
            .unwrap_or_default();
        for (name, _) in &self.fields {
            if dependencies.self_fields().iter().any(|input| input == name)
                && let Some(found) = self.walk_self_dependencies(name, path, done)
            {
                return Some(found);
            }
        }
        path.pop();
        done.insert(field);
        None
    }
}

/// Serialized form of a field inside a model definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Serialized form of a model, as loaded from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub options: ModelOptions,
}
