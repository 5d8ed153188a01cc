use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use runtime_models::DynamicModelsConfig;
use runtime_models::model::{ModelFactory, PRIMARY_KEY_COLUMN};
use runtime_models::schema::{MemorySchemaStore, SchemaStore};
use runtime_models::FieldKindRegistry;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "schema-tool")]
#[command(about = "Developer tooling for runtime model schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every model schema of a store snapshot and print the result
    Describe {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Describe { store, config } => describe(&store, config.as_deref()).await,
        Command::CheckConfig { config } => check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<DynamicModelsConfig> {
    match path {
        Some(path) => DynamicModelsConfig::from_path(path)
            .with_context(|| format!("Invalid config '{}'", path.display())),
        None => Ok(DynamicModelsConfig::default()),
    }
}

async fn describe(store_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = MemorySchemaStore::load_snapshot(store_path)
        .await
        .with_context(|| format!("Failed to load schema store '{}'", store_path.display()))?;
    let kinds = FieldKindRegistry::default();

    let models = store.list_models().await?;
    if models.is_empty() {
        println!("No model schemas in {}", store_path.display());
        return Ok(());
    }

    let mut failures = 0;
    for row in models {
        let snapshot = store.snapshot(row.id).await?;
        match ModelFactory::compile(&snapshot, &config, &kinds) {
            Ok(model) => {
                println!(
                    "{}.{} (schema #{}, table '{}')",
                    model.namespace(),
                    model.type_name(),
                    model.schema_id(),
                    model.table_name()
                );
                println!("  {:<24} INTEGER PRIMARY KEY", PRIMARY_KEY_COLUMN);
                for field in model.fields() {
                    let column = field.column_definition();
                    let mut line = format!("  {:<24} {}", column.name, column.data_type);
                    if let Some(max_length) = column.max_length {
                        line.push_str(&format!("({})", max_length));
                    }
                    if !column.nullable {
                        line.push_str(" NOT NULL");
                    }
                    if column.unique {
                        line.push_str(" UNIQUE");
                    }
                    if let Some(target) = &column.references {
                        line.push_str(&format!(" REFERENCES {}", target));
                    }
                    println!("{}", line);
                }
            }
            Err(err) => {
                failures += 1;
                println!("{}: FAILED ({})", row.name, err);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} model schema(s) failed to compile", failures));
    }
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    println!("Config: {}", path.display());
    println!("Namespace: {}", config.namespace);
    println!("Default fields: {}", config.default_fields.len());
    println!("Cache timeout: {}s", config.cache_timeout.as_secs());
    println!("Config: OK");
    Ok(())
}
