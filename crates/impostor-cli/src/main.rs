mod config;
mod demo;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use impostor_core::{Catalog, ModelRegistry, SchemaError};
use impostor_generate::{FetchOptions, GenerationError, ObjectStore, StoreOptions};
use serde_json::Value;
use thiserror::Error;

use config::{ModelFile, load_config, load_models};
use demo::register_demo_models;
use logging::init_logging;

#[derive(Debug, Error)]
enum CliError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "impostor", version, about = "Impostor fake-record CLI")]
struct Cli {
    /// Path to the config file (defaults to ./impostor.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Model definition file (TOML or JSON); overrides `models_file`.
    #[arg(long, global = true)]
    models: Option<PathBuf>,
    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered model names.
    Models,
    /// Print the resolved type definitions.
    Types,
    /// Print one page of record previews.
    Page(PageArgs),
    /// Page through records, then fetch each one fully by id.
    Walk(WalkArgs),
    /// Print the JSON Schema of the model definition file.
    Schema,
}

#[derive(Args, Debug)]
struct PageArgs {
    model: String,
    /// Zero-based page number.
    #[arg(long, default_value_t = 0)]
    page: usize,
    #[arg(long, default_value_t = 10)]
    size: usize,
}

#[derive(Args, Debug)]
struct WalkArgs {
    model: String,
    #[arg(long, default_value_t = 3)]
    count: usize,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.json)?;

    if let Command::Schema = cli.command {
        let schema = schemars::schema_for!(ModelFile);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let models_file = cli.models.or(config.models_file);
    let catalog = build_catalog(models_file)?;

    match cli.command {
        Command::Models => {
            for name in catalog.model_names() {
                println!("{name}");
            }
        }
        Command::Types => print!("{}", catalog.render_type_definitions()),
        Command::Page(args) => {
            let mut store = open_store(catalog, config.store);
            let page = store.get_model(&args.model, &FetchOptions::page(args.page, args.size))?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Walk(args) => {
            let mut store = open_store(catalog, config.store);
            let records = run_walk(&mut store, &args.model, args.count)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Schema => {}
    }

    Ok(())
}

fn build_catalog(models_file: Option<PathBuf>) -> Result<Catalog, CliError> {
    let mut registry = ModelRegistry::new();
    match models_file {
        Some(path) => {
            for definition in load_models(&path)? {
                registry.add_definition(definition)?;
            }
            tracing::info!(path = %path.display(), "model definitions loaded");
        }
        None => register_demo_models(&mut registry)?,
    }
    Ok(registry.realize()?)
}

fn open_store(catalog: Catalog, options: StoreOptions) -> ObjectStore {
    tracing::info!(seed = options.seed, "object store ready");
    ObjectStore::new(Arc::new(catalog), options)
}

/// Mint `count` previews, then upgrade each one through fetch-by-id.
fn run_walk(store: &mut ObjectStore, model: &str, count: usize) -> Result<Value, CliError> {
    let ids: Vec<String> = store
        .fetch_page(model, 0, count)?
        .iter()
        .filter_map(|record| record.get(impostor_core::ID_FIELD))
        .map(|id| match id {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect();

    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        records.push(Value::Object(store.fetch_by_id(model, id)?));
    }
    tracing::info!(model, records = records.len(), "walk finished");
    Ok(Value::Array(records))
}
