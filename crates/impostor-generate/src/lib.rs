//! Lazy, relationship-aware record generation for Impostor.
//!
//! This crate consumes a realized [`impostor_core::Catalog`] and serves
//! records on demand: identities are minted once and fields are only built
//! when a request needs them.

pub mod errors;
pub mod options;
pub mod ownership;
pub mod sampler;
pub mod store;
pub mod values;

pub use errors::GenerationError;
pub use options::StoreOptions;
pub use ownership::{ObjectKey, OwnershipLedger};
pub use store::{FetchOptions, LoadState, LoadedObject, ObjectStore};
