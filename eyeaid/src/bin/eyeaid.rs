//! Demo runner: one patient record and one fundus image through the
//! screening pipeline against an HTTP reasoning backend.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eyeaid::config::{OracleConfig, PipelineConfig};
use eyeaid::core::PatientContext;
use eyeaid::events::{EventSink, LoggingEventSink, NoOpEventSink};
use eyeaid::oracle::{HttpOracle, ImageRef};
use eyeaid::pipeline::PipelineOrchestrator;

#[derive(Parser)]
#[command(name = "eyeaid")]
#[command(about = "Run the EyeAid retinal screening pipeline on one image")]
struct Cli {
    /// Patient context JSON file ({"age": 59, "known_conditions": [...], "symptoms": [...]})
    #[arg(long)]
    patient: PathBuf,

    /// Retinal fundus image
    #[arg(long)]
    image: PathBuf,

    /// Pipeline configuration JSON file (intake thresholds, generation parameters)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the oracle model (otherwise EYEAID_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Refuse to start unless EYEAID_API_TOKEN is set
    #[arg(long)]
    require_token: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Log pipeline lifecycle events
    #[arg(long)]
    events: bool,
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("eyeaid=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {what} file {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json)?;

    let patient: PatientContext = read_json(&cli.patient, "patient")?;
    let config: PipelineConfig = match &cli.config {
        Some(path) => read_json(path, "config")?,
        None => PipelineConfig::default(),
    };
    anyhow::ensure!(
        cli.image.is_file(),
        "image file {} does not exist",
        cli.image.display()
    );

    let mut oracle_config = OracleConfig::from_env()?;
    if let Some(model) = cli.model {
        oracle_config = oracle_config.with_model(model);
    }
    if cli.require_token {
        oracle_config = oracle_config.with_token_required(true);
    }
    tracing::info!(
        base_url = %oracle_config.base_url,
        model = %oracle_config.model,
        timeout_secs = oracle_config.timeout_secs,
        "Using HTTP oracle"
    );

    let sink: Arc<dyn EventSink> = if cli.events {
        Arc::new(LoggingEventSink::info())
    } else {
        Arc::new(NoOpEventSink)
    };
    let pipeline = PipelineOrchestrator::builder()
        .oracle(Arc::new(HttpOracle::new(oracle_config)?))
        .config(config)
        .event_sink(sink)
        .build()?;

    let outcome = pipeline.run(&patient, &ImageRef::path(cli.image)).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
