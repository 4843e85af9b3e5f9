mod logging;
mod settings;
mod signals;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use schemagate_core::{AttributeSet, Error as CoreError, Events, Schema};
use schemagate_model::{ModelOptions, ValidatedModel};
use schemagate_xml::{HttpTransport, SyncError, SyncOptions, TransportError, XmlModel, XmlSync};
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use logging::init_logging;
use settings::load_settings;
use signals::ErrorLog;

#[derive(Debug, Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("logging error: {0}")]
    Logging(#[from] TryInitError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} error signal(s) emitted")]
    Rejected(usize),
}

#[derive(Parser, Debug)]
#[command(name = "schemagate", version, about = "Schema-gated models and XML sync")]
struct Cli {
    /// Settings file (defaults to ./schemagate.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a model from a JSON attribute file and report schema errors.
    Check(CheckArgs),
    /// Fetch an XML document into a model.
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// JSON Schema gating the model.
    #[arg(long, value_name = "SCHEMA")]
    schema: PathBuf,
    /// JSON object with the initial attributes.
    #[arg(value_name = "ATTRIBUTES")]
    attributes: PathBuf,
    /// Attribute(s) to unset after construction.
    #[arg(long, value_name = "NAME")]
    unset: Vec<String>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Document URL.
    #[arg(value_name = "URL")]
    url: String,
    /// JSON Schema the parsed document must satisfy.
    #[arg(long, value_name = "SCHEMA")]
    schema: Option<PathBuf>,
    /// JSON Schema gating the model the document is committed to.
    #[arg(long, value_name = "SCHEMA")]
    model_schema: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_logging(&settings.logging)?;

    match cli.command {
        Command::Check(args) => run_check(args),
        Command::Fetch(args) => run_fetch(args, &settings).await,
    }
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let schema = load_schema(&args.schema)?;
    let attributes = load_attributes(&args.attributes)?;

    let events = Events::new();
    let errors = ErrorLog::collect(&events);
    let mut model =
        ValidatedModel::new(attributes, ModelOptions::with_schema(schema).events(events));
    for name in args.unset {
        model.unset(name);
    }

    tracing::info!(event = "check_finished", cid = %model.cid(), attributes = model.attributes().len());
    println!("{}", serde_json::to_string_pretty(&model.to_json())?);
    errors.finish()
}

async fn run_fetch(args: FetchArgs, settings: &settings::Settings) -> Result<(), CliError> {
    let transport = HttpTransport::new(&settings.http)?;
    let sync = XmlSync::new(Arc::new(transport)).with_parser_options(settings.parser.clone());

    let events = Events::new();
    let errors = ErrorLog::collect(&events);
    let options = ModelOptions {
        schema: args.model_schema.as_deref().map(load_schema).transpose()?,
        ..ModelOptions::default()
    };
    let model = XmlModel::new(ValidatedModel::empty(options.events(events)), sync)
        .with_url(args.url.as_str());

    let mut sync_options = SyncOptions::new();
    if let Some(path) = args.schema.as_deref() {
        sync_options = sync_options.schema(load_schema(path)?);
    }

    tracing::info!(event = "fetch_started", url = %args.url);
    model.fetch(sync_options)?.wait().await;
    tracing::info!(event = "fetch_finished", url = %args.url);

    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Object(model.attributes()))?
    );
    errors.finish()
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(Schema::from_json_str(&content)?)
}

fn load_attributes(path: &Path) -> Result<AttributeSet, CliError> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Object(attributes) => Ok(attributes),
        _ => Err(CliError::InvalidInput(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}
