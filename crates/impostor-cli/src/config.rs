use std::path::{Path, PathBuf};

use impostor_core::ModelDefinition;
use impostor_generate::StoreOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "impostor.toml";

/// Contents of `impostor.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpostorConfig {
    pub store: StoreOptions,
    /// Model definitions to serve instead of the bundled demo models.
    pub models_file: Option<PathBuf>,
}

/// Model definition file, TOML (`[[models]]`) or JSON (`{"models": [...]}`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelFile {
    pub models: Vec<ModelDefinition>,
}

/// Load the config at `path`, or `impostor.toml` from the working directory
/// when present. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<ImpostorConfig, CliError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(ImpostorConfig::default());
            }
            fallback
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let config: ImpostorConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn load_models(path: &Path) -> Result<Vec<ModelDefinition>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let file: ModelFile = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    Ok(file.models)
}
