//! clens-ai - CulinaryLens command line
//!
//! Runs the perception pipeline over recorded detections, reconciles
//! protocols against an inventory, and generates offline protocols.
//! JSON results go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clens_ai::fusion::fuse;
use clens_ai::offline::synthesize_offline_protocol;
use clens_ai::perception::ReplayDetector;
use clens_ai::types::ImagePayload;
use clens_ai::{ModelRegistry, PerceptionPipeline, PipelineConfig};
use clens_common::config::{load_config, TomlConfig};
use clens_common::events::EventBus;
use clens_common::models::{Ingredient, NeuralProtocol, UserPreferences};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line arguments for clens-ai
#[derive(Parser, Debug)]
#[command(name = "clens-ai")]
#[command(about = "Ingredient perception and protocol fusion")]
#[command(version)]
struct Args {
    /// Configuration file (overrides CLENS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the perception pipeline and print the inventory
    Scan {
        /// Recorded primary detections (JSON array)
        #[arg(long, value_name = "FILE")]
        detections: PathBuf,

        /// Recorded fallback detections (JSON array)
        #[arg(long, value_name = "FILE")]
        fallback: Option<PathBuf>,

        /// Image handed to the detection models
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },

    /// Reconcile a protocol with an inventory
    Fuse {
        /// Inventory (JSON array of ingredients)
        #[arg(long, value_name = "FILE")]
        inventory: PathBuf,

        /// Protocol (JSON object)
        #[arg(long, value_name = "FILE")]
        protocol: PathBuf,
    },

    /// Generate and reconcile an offline protocol
    Offline {
        /// Inventory (JSON array of ingredients)
        #[arg(long, value_name = "FILE")]
        inventory: PathBuf,

        /// User preferences (JSON object)
        #[arg(long, value_name = "FILE")]
        preferences: Option<PathBuf>,
    },

    /// Show the model registry
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("clens-ai {}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(ModelRegistry::with_default_models());

    match args.command {
        Command::Scan {
            detections,
            fallback,
            image,
        } => scan(&config, registry, &detections, fallback.as_deref(), image.as_deref()).await,
        Command::Fuse {
            inventory,
            protocol,
        } => {
            let inventory: Vec<Ingredient> = read_json(&inventory).await?;
            let mut protocol: NeuralProtocol = read_json(&protocol).await?;
            protocol.clear_fusion_output();
            print_json(&fuse(&inventory, &protocol))
        }
        Command::Offline {
            inventory,
            preferences,
        } => {
            let inventory: Vec<Ingredient> = read_json(&inventory).await?;
            let preferences: UserPreferences = match preferences {
                Some(path) => read_json(&path).await?,
                None => UserPreferences::default(),
            };
            let protocol = synthesize_offline_protocol(&inventory, &preferences, &registry);
            print_json(&fuse(&inventory, &protocol))
        }
        Command::Models => {
            let models = registry.snapshot();
            print_json(&serde_json::json!({
                "stats": registry.stats(),
                "models": models.as_slice(),
            }))
        }
    }
}

async fn scan(
    config: &TomlConfig,
    registry: Arc<ModelRegistry>,
    detections: &Path,
    fallback: Option<&Path>,
    image: Option<&Path>,
) -> Result<()> {
    let primary = ReplayDetector::from_json("primary", &read_text(detections).await?)?;
    let image = match image {
        Some(path) => ImagePayload::new(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => ImagePayload::default(),
    };

    let event_bus = EventBus::new(64);
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Some(message) = event.status_message() {
                info!("{}", message);
            }
        }
    });

    let mut pipeline = PerceptionPipeline::new(
        PipelineConfig::from(&config.perception),
        registry,
        Arc::new(primary),
    )
    .with_events(event_bus);

    if let Some(path) = fallback {
        let model = ReplayDetector::from_json("fallback", &read_text(path).await?)?;
        pipeline = pipeline.with_fallback(Arc::new(model));
    }

    let inventory = pipeline.run(&image).await?;
    print_json(&inventory)
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
