//! Core contracts for Impostor.
//!
//! This crate defines model templates, the closed set of field kinds, the
//! fixed-point type resolver and the type-level relationship registry. The
//! runtime object store lives in `impostor-generate`.

pub mod error;
pub mod field;
pub mod registry;
pub mod relationships;
pub mod render;
pub mod resolver;
pub mod template;
pub mod types;

pub use error::{Result, SchemaError};
pub use field::{
    CountRange, Dependencies, DependsOn, FieldKind, FieldSpec, IdKind, Relationship, SELF_MODEL,
    Transform,
};
pub use registry::{Catalog, ModelRegistry};
pub use relationships::Relationships;
pub use resolver::{TypeResolution, resolve_types};
pub use template::{FieldDefinition, ModelDefinition, ModelOptions, ModelTemplate, OwnsOptions};
pub use types::{Pending, PreviewType, ResolvedTypes, type_name};

/// A materialized record: field name to JSON value, in build order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Name of the field every model must declare as its identity.
pub const ID_FIELD: &str = "id";
