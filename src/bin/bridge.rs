//! Bridge CLI - Command-line interface for Telemetry Bridge
//!
//! Commands:
//! - convert: Convert one raw value through a data type tag
//! - normalize: Turn collected batches into telemetry records
//! - send: Normalize collected batches and deliver them
//! - models: Manage relation models in a models directory

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use telemetry_bridge::catalog::{DirectoryModelRepository, ModelRegistry, RelationCatalog};
use telemetry_bridge::pipeline::StaticGenerator;
use telemetry_bridge::{
    convert, BridgeConfig, BridgeError, CollectBatch, DataType, Grouping, JsonEncoder, MatchBy,
    Normalizer, Relation, TelemetryRecord, BRIDGE_VERSION,
};

/// Bridge - Relation-driven telemetry normalization and delivery
#[derive(Parser)]
#[command(name = "bridge")]
#[command(version = BRIDGE_VERSION)]
#[command(about = "Normalize device telemetry and deliver it over HTTP", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one raw value and print it as JSON (null when it does not convert)
    Convert {
        /// Raw collected value
        value: String,

        /// Data type tag (e.g. "number", "hexstring-littleendian-int")
        #[arg(short, long)]
        data_type: String,

        /// Decimal scale factor for numeric tags
        #[arg(short, long, default_value = "1")]
        factor: String,
    },

    /// Normalize collected batches into telemetry records
    Normalize {
        /// Directory of relation models (one <model>.json per model)
        #[arg(short, long)]
        models: PathBuf,

        /// Input file with a JSON array of batches (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// One datastream per input instead of grouping by telemetry id
        #[arg(long)]
        simple: bool,

        /// Match collected field names against relation aliases
        #[arg(long)]
        by_alias: bool,

        /// Pretty-print the records
        #[arg(long)]
        pretty: bool,
    },

    /// Normalize collected batches and deliver them
    Send {
        /// TOML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Input file with a JSON array of batches (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Manage relation models
    Models {
        /// Models directory
        #[arg(short, long, default_value = "models")]
        dir: PathBuf,

        #[command(subcommand)]
        command: ModelsCommand,
    },
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List models and their relation counts
    List,
    /// Print a model's relations
    Show { name: String },
    /// Create or replace a model from a JSON relations file
    Put {
        name: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Merge relations into a model, by field
    Update {
        name: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Remove a model
    Delete { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), BridgeCliError> {
    match cli.command {
        Commands::Convert {
            value,
            data_type,
            factor,
        } => cmd_convert(&value, &data_type, &factor),

        Commands::Normalize {
            models,
            input,
            simple,
            by_alias,
            pretty,
        } => cmd_normalize(&models, &input, simple, by_alias, pretty),

        Commands::Send { config, input } => cmd_send(&config, &input).await,

        Commands::Models { dir, command } => cmd_models(&dir, command),
    }
}

fn cmd_convert(value: &str, data_type: &str, factor: &str) -> Result<(), BridgeCliError> {
    let converted = convert(value, &DataType::from(data_type), factor);
    println!("{}", serde_json::to_string(&converted)?);
    Ok(())
}

fn cmd_normalize(
    models: &Path,
    input: &Path,
    simple: bool,
    by_alias: bool,
    pretty: bool,
) -> Result<(), BridgeCliError> {
    let registry = ModelRegistry::load(DirectoryModelRepository::new(models))?;
    if registry.catalog().snapshot().is_empty() {
        return Err(BridgeCliError::NoModels(models.to_path_buf()));
    }

    let grouping = if simple { Grouping::Simple } else { Grouping::Grouped };
    let match_by = if by_alias { MatchBy::Alias } else { MatchBy::Field };
    let normalizer = Normalizer::new(registry.catalog())
        .with_grouping(grouping)
        .with_match_by(match_by);

    let batches = read_batches(input)?;
    let records: Vec<TelemetryRecord> = batches
        .iter()
        .filter_map(|batch| normalizer.normalize(batch))
        .collect();

    let encoder = if pretty { JsonEncoder::pretty() } else { JsonEncoder::new() };
    for record in &records {
        println!("{}", encoder.encode_record(record)?);
    }
    info!(batches = batches.len(), records = records.len(), "normalization finished");
    Ok(())
}

async fn cmd_send(config: &Path, input: &Path) -> Result<(), BridgeCliError> {
    let config = BridgeConfig::from_file(config)?;
    if config.delivery.url.is_empty() {
        return Err(BridgeCliError::MissingUrl);
    }

    let catalog = Arc::new(RelationCatalog::new());
    catalog.reload(&DirectoryModelRepository::new(&config.models_dir))?;

    let batches = read_batches(input)?;
    let pipeline = config
        .pipeline(catalog)
        .with_generator(Arc::new(StaticGenerator::new(batches)));

    let stop = pipeline.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, no further retries");
            stop.stop();
        }
    });

    pipeline.send().await?;
    Ok(())
}

fn cmd_models(dir: &Path, command: ModelsCommand) -> Result<(), BridgeCliError> {
    let registry = ModelRegistry::load(DirectoryModelRepository::new(dir))?;

    match command {
        ModelsCommand::List => {
            let summary: Vec<ModelSummary> = registry
                .list()?
                .into_iter()
                .map(|model| ModelSummary {
                    relations: model.relations.len(),
                    name: model.name,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        ModelsCommand::Show { name } => {
            let relations = registry
                .get(&name)?
                .ok_or(BridgeError::ModelNotFound(name))?;
            println!("{}", serde_json::to_string_pretty(&relations)?);
        }
        ModelsCommand::Put { name, file } => {
            registry.upsert(&name, read_relations(&file)?)?;
            info!(model = %name, "model stored");
        }
        ModelsCommand::Update { name, file } => {
            registry.update(&name, read_relations(&file)?)?;
            info!(model = %name, "model updated");
        }
        ModelsCommand::Delete { name } => {
            registry.delete(&name)?;
            info!(model = %name, "model deleted");
        }
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String, BridgeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_batches(input: &Path) -> Result<Vec<CollectBatch>, BridgeCliError> {
    let batches: Vec<CollectBatch> = serde_json::from_str(&read_input(input)?)?;
    if batches.is_empty() {
        return Err(BridgeCliError::NoBatches);
    }
    Ok(batches)
}

fn read_relations(file: &Path) -> Result<Vec<Relation>, BridgeCliError> {
    Ok(serde_json::from_str(&read_input(file)?)?)
}

#[derive(serde::Serialize)]
struct ModelSummary {
    name: String,
    relations: usize,
}

// Error types

#[derive(Debug)]
enum BridgeCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Bridge(BridgeError),
    NoBatches,
    NoModels(PathBuf),
    MissingUrl,
}

impl From<io::Error> for BridgeCliError {
    fn from(e: io::Error) -> Self {
        BridgeCliError::Io(e)
    }
}

impl From<serde_json::Error> for BridgeCliError {
    fn from(e: serde_json::Error) -> Self {
        BridgeCliError::Json(e)
    }
}

impl From<BridgeError> for BridgeCliError {
    fn from(e: BridgeError) -> Self {
        BridgeCliError::Bridge(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BridgeCliError> for CliError {
    fn from(e: BridgeCliError) -> Self {
        match e {
            BridgeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BridgeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BridgeCliError::Bridge(e) => bridge_error(e),
            BridgeCliError::NoBatches => CliError {
                code: "NO_BATCHES".to_string(),
                message: "No batches found in input".to_string(),
                hint: Some("Input must be a JSON array of {device, path, items}".to_string()),
            },
            BridgeCliError::NoModels(dir) => CliError {
                code: "NO_MODELS".to_string(),
                message: format!("No relation models found in {}", dir.display()),
                hint: Some("Add models with 'bridge models put'".to_string()),
            },
            BridgeCliError::MissingUrl => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: "No delivery url configured".to_string(),
                hint: Some("Set url in the [delivery] section".to_string()),
            },
        }
    }
}

fn bridge_error(e: BridgeError) -> CliError {
    let (code, hint) = match &e {
        BridgeError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
        BridgeError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
        BridgeError::ModelNotFound(_) => ("MODEL_NOT_FOUND", "Run 'bridge models list'"),
        BridgeError::InvalidModelName(_) => {
            ("INVALID_MODEL_NAME", "Model names cannot contain path separators")
        }
        BridgeError::MissingCollectionGenerator => ("NO_GENERATOR", "Provide collected batches"),
        BridgeError::EncodingError(_) => ("ENCODING_ERROR", "Check the produced records"),
        BridgeError::ConfigError(_) => ("CONFIG_ERROR", "Check the TOML configuration"),
        BridgeError::MessageFailed(_) | BridgeError::DeliveryFailures(_) => {
            ("DELIVERY_FAILED", "Check the delivery url and credentials")
        }
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}
