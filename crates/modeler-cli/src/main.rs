//! Modeler command-line runner.
//!
//! Loads a model snapshot into the in-memory store, applies an editing
//! script through the relation engine and prints the resulting model.
//!
//! Usage:
//!   modeler script.json --model model.json
//!   modeler script.json --model model.json --relations --output out.json

mod cli;
mod logging;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tracing::info;

use modeler_core::{node_relations, ChannelNotifier, EngineConfig, ModelService, RelationListing};
use modeler_state_inmemory::{InMemoryStateStoreProvider, ModelSnapshot};

use crate::cli::Args;
use crate::script::{parse_script, ScriptRunner, StepReport};

#[derive(Debug, Serialize)]
struct RunOutput {
    steps: Vec<StepReport>,
    notifications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relations: Option<BTreeMap<String, Vec<RelationListing>>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::load()?,
    };
    if args.json_logs {
        config.json_logs = true;
    }
    logging::init_logging(&config)?;

    let snapshot = match &args.model {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read model {}", path.display()))?;
            ModelSnapshot::from_json(&raw)?
        }
        None => ModelSnapshot::default(),
    };

    let raw_script = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let commands = parse_script(&raw_script)?;

    let provider = InMemoryStateStoreProvider::with_model(snapshot)?;
    let (node_repo, edge_repo, unit_of_work) = provider.create_repositories();
    let (notifier, mut notifications) = ChannelNotifier::new(config.notification_buffer);

    let service = ModelService::new(node_repo, edge_repo, unit_of_work, Arc::new(notifier), config);
    service.load().await?;

    info!(commands = commands.len(), "Running script");
    let steps = ScriptRunner::new(&service).run(commands).await?;

    let mut messages = Vec::new();
    while let Ok(message) = notifications.try_recv() {
        messages.push(message);
    }

    let final_model = provider.snapshot().await;
    let output = if args.relations {
        let relations = final_model
            .nodes
            .iter()
            .map(|node| (node.id.0.clone(), node_relations(&node.data)))
            .collect();
        RunOutput {
            steps,
            notifications: messages,
            model: None,
            relations: Some(relations),
        }
    } else {
        RunOutput {
            steps,
            notifications: messages,
            model: Some(final_model),
            relations: None,
        }
    };

    let rendered = serde_json::to_string_pretty(&output)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
