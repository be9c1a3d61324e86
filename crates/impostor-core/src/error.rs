use thiserror::Error;

/// Setup-time errors raised while registering and realizing models.
///
/// Every variant is fatal: a registry that fails to realize must not serve
/// any query.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A model name was registered twice.
    #[error("model '{0}' redefined")]
    Redefinition(String),
    /// A model template violates a structural rule.
    #[error("invalid model '{model}': {reason}")]
    InvalidModel { model: String, reason: String },
    /// The type fixed point stalled with fields still pending.
    #[error("unresolvable type definitions: {}", .unresolved.join(", "))]
    Unresolvable { unresolved: Vec<String> },
    /// A relationship names a model that was never registered.
    #[error("model '{model}' references unknown model '{target}'")]
    UnknownModel { model: String, target: String },
}

impl SchemaError {
    pub(crate) fn invalid(model: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidModel {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, SchemaError>;
