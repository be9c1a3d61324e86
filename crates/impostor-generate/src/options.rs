use impostor_core::CountRange;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Options for the object store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StoreOptions {
    /// Seed for the store's random generator.
    pub seed: u64,
    /// Maximum number of records materializing at once through nested loads.
    pub max_load_depth: usize,
    /// Sample size range for `set_of` fields that declare none.
    pub default_sample_range: CountRange,
    /// Identities pagination may mint for a model without `max_count`.
    pub max_identities: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            max_load_depth: 32,
            default_sample_range: CountRange::exactly(3.0),
            max_identities: 10_000,
        }
    }
}

impl StoreOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
