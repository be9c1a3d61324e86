use std::collections::HashMap;

use tracing::info;

use crate::error::SchemaError;
use crate::field::FieldSpec;
use crate::relationships::Relationships;
use crate::render::render_type_definitions;
use crate::resolver::resolve_types;
use crate::template::{ModelDefinition, ModelOptions, ModelTemplate};
use crate::types::{PreviewType, ResolvedTypes};

/// Collects model templates before realization.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    templates: Vec<ModelTemplate>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Registering the same name twice is an error.
    pub fn add_model<I, K>(
        &mut self,
        name: impl Into<String>,
        fields: I,
        options: ModelOptions,
    ) -> Result<&mut Self, SchemaError>
    where
        I: IntoIterator<Item = (K, FieldSpec)>,
        K: Into<String>,
    {
        let name = name.into();
        if self.templates.iter().any(|template| template.name == name) {
            return Err(SchemaError::Redefinition(name));
        }

        let fields = fields
            .into_iter()
            .map(|(field, spec)| (field.into(), spec))
            .collect();
        self.templates
            .push(ModelTemplate::new(name, fields, options)?);
        Ok(self)
    }

    /// Register a model loaded from a definition file.
    pub fn add_definition(&mut self, definition: ModelDefinition) -> Result<&mut Self, SchemaError> {
        let ModelDefinition {
            name,
            fields,
            options,
        } = definition;
        self.add_model(
            name,
            fields
                .into_iter()
                .map(|field| (field.name, FieldSpec::from(field.kind))),
            options,
        )
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    /// Resolve every field type, then derive ownership edges.
    ///
    /// Consumes the registry, so resolution runs exactly once.
    pub fn realize(self) -> Result<Catalog, SchemaError> {
        let resolution = resolve_types(&self.templates)?;
        let relationships = Relationships::derive(&self.templates)?;

        info!(
            models = self.templates.len(),
            previews = resolution.previews.len(),
            rounds = resolution.rounds,
            "models realized"
        );

        let index = self
            .templates
            .iter()
            .enumerate()
            .map(|(idx, template)| (template.name.clone(), idx))
            .collect();

        Ok(Catalog {
            templates: self.templates,
            index,
            types: resolution.types,
            previews: resolution.previews,
            relationships,
        })
    }
}

/// Realized, immutable model set shared by the object store.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<ModelTemplate>,
    index: HashMap<String, usize>,
    types: ResolvedTypes,
    previews: Vec<PreviewType>,
    relationships: Relationships,
}

impl Catalog {
    /// Registered model names in registration order.
    pub fn model_names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn template(&self, model: &str) -> Option<&ModelTemplate> {
        self.index.get(model).map(|idx| &self.templates[*idx])
    }

    pub fn types(&self) -> &ResolvedTypes {
        &self.types
    }

    pub fn preview_types(&self) -> &[PreviewType] {
        &self.previews
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn render_type_definitions(&self) -> String {
        render_type_definitions(&self.templates, &self.types, &self.previews)
    }
}
