use impostor_core::SchemaError;
use thiserror::Error;

/// Errors emitted while loading or sampling records.
///
/// All of them are scoped to the request that triggered them.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("{model} '{id}' not found")]
    NotFound { model: String, id: String },
    #[error("invalid id '{id}' for model '{model}'")]
    InvalidId { model: String, id: String },
    #[error("record of model '{0}' has no usable id")]
    MissingIdentity(String),
    #[error("field '{model}.{field}' reads '{input}' which is not materialized")]
    MissingInput {
        model: String,
        field: String,
        input: String,
    },
    #[error("model '{0}' has no owner relationship")]
    MissingRelationship(String),
    #[error("dependency cycle through field '{model}.{field}'")]
    DependencyCycle { model: String, field: String },
    #[error("load depth limit {limit} exceeded while loading '{model}'")]
    DepthExceeded { model: String, limit: usize },
    #[error("builder for '{model}.{field}' failed: {source}")]
    Builder {
        model: String,
        field: String,
        #[source]
        source: Box<GenerationError>,
    },
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl GenerationError {
    /// Innermost error behind any builder wrappers.
    pub fn root_cause(&self) -> &GenerationError {
        match self {
            GenerationError::Builder { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root_cause(),
            GenerationError::NotFound { .. } | GenerationError::UnknownModel(_)
        )
    }

    pub fn is_builder_failure(&self) -> bool {
        matches!(self, GenerationError::Builder { .. })
    }
}
