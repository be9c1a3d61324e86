use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SchemaError;
use crate::template::ModelTemplate;

/// Type-level ownership edges derived from `owns` options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relationships {
    /// Owner model name to owned model name.
    owns: BTreeMap<String, String>,
    /// Owned model name to owner model name.
    owned: BTreeMap<String, String>,
}

impl Relationships {
    /// Single pass over the templates collecting every `owns` edge.
    pub fn derive(templates: &[ModelTemplate]) -> Result<Self, SchemaError> {
        let mut relationships = Self::default();

        for template in templates {
            let Some(owns) = &template.options.owns else {
                continue;
            };

            if !templates.iter().any(|other| other.name == owns.model) {
                return Err(SchemaError::UnknownModel {
                    model: template.name.clone(),
                    target: owns.model.clone(),
                });
            }

            if let Some(existing) = relationships.owned.get(&owns.model) {
                return Err(SchemaError::invalid(
                    &template.name,
                    format!("model '{}' is already owned by '{existing}'", owns.model),
                ));
            }

            relationships
                .owns
                .insert(template.name.clone(), owns.model.clone());
            relationships
                .owned
                .insert(owns.model.clone(), template.name.clone());
        }

        Ok(relationships)
    }

    /// Model owned by `owner`, if it declares one.
    pub fn owned_model(&self, owner: &str) -> Option<&str> {
        self.owns.get(owner).map(String::as_str)
    }

    /// Model that owns `owned`, if any.
    pub fn owner_model(&self, owned: &str) -> Option<&str> {
        self.owned.get(owned).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.owns.is_empty()
    }
}
