//! Editing scripts: the gestures a user makes on the canvas, as data.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use modeler_core::{
    Aspect, ConnectOutcome, ConnectionCheck, Connection, EdgeId, EdgeType, HandleId, ModelService,
    NodeId, NodeType,
};

/// One editing gesture
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    /// Place a new node
    #[serde(rename_all = "camelCase")]
    AddNode {
        node_type: NodeType,
        #[serde(default = "default_aspect")]
        aspect: Aspect,
    },

    /// Draw a connection. `alias` names the new edge for later commands.
    #[serde(rename_all = "camelCase")]
    Connect {
        source: NodeId,
        source_handle: HandleId,
        target: NodeId,
        target_handle: HandleId,
        #[serde(default)]
        edge_type: Option<EdgeType>,
        #[serde(default)]
        alias: Option<String>,
    },

    /// Ask whether a connection would be accepted
    #[serde(rename_all = "camelCase")]
    Check {
        source: NodeId,
        source_handle: HandleId,
        target: NodeId,
        target_handle: HandleId,
        #[serde(default)]
        edge_type: Option<EdgeType>,
    },

    /// Remove an edge, by alias or id
    Disconnect { edge: String },

    /// Change an edge between Part and Fulfilled
    #[serde(rename_all = "camelCase")]
    Retype { edge: String, edge_type: EdgeType },

    /// Remove a node and its edges
    DeleteNode { node: NodeId },
}

fn default_aspect() -> Aspect {
    Aspect::Function
}

/// What a command did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StepReport {
    Added { node: NodeId },
    #[serde(rename_all = "camelCase")]
    Connected {
        edge: EdgeId,
        edge_type: EdgeType,
        locked: bool,
    },
    Checked { result: ConnectionCheck },
    Rejected { reason: String },
    Abandoned { node: NodeId },
    Duplicate { edge: EdgeId },
    Disconnected { edge: EdgeId },
    Retyped { edge: EdgeId, applied: bool },
    Deleted { node: NodeId },
}

/// Runs commands against a model service, remembering edge aliases
pub struct ScriptRunner<'a> {
    service: &'a ModelService,
    aliases: HashMap<String, EdgeId>,
}

impl<'a> ScriptRunner<'a> {
    /// Create a runner for `service`
    pub fn new(service: &'a ModelService) -> Self {
        Self {
            service,
            aliases: HashMap::new(),
        }
    }

    /// Run every command in order, stopping at the first hard error.
    /// Rejected gestures are reported and do not stop the script.
    pub async fn run(&mut self, commands: Vec<Command>) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(commands.len());
        for (step, command) in commands.into_iter().enumerate() {
            let report = self.apply(command).await?;
            info!(step, report = ?report, "Script step finished");
            reports.push(report);
        }
        Ok(reports)
    }

    async fn apply(&mut self, command: Command) -> Result<StepReport> {
        let report = match command {
            Command::AddNode { node_type, aspect } => {
                let node = self.service.add_node(node_type, aspect).await?;
                StepReport::Added { node: node.id }
            }
            Command::Connect {
                source,
                source_handle,
                target,
                target_handle,
                edge_type,
                alias,
            } => {
                let connection = Connection::new(source, source_handle, target, target_handle);
                match self.service.connect(&connection, edge_type).await? {
                    ConnectOutcome::Connected(edge) => {
                        if let Some(alias) = alias {
                            self.aliases.insert(alias, edge.id.clone());
                        }
                        StepReport::Connected {
                            locked: edge.is_locked(),
                            edge_type: edge.edge_type,
                            edge: edge.id,
                        }
                    }
                    ConnectOutcome::Rejected(rejection) => StepReport::Rejected {
                        reason: rejection.to_string(),
                    },
                    ConnectOutcome::Abandoned(node) => StepReport::Abandoned { node },
                    ConnectOutcome::Duplicate(edge) => {
                        if let Some(alias) = alias {
                            self.aliases.insert(alias, edge.clone());
                        }
                        StepReport::Duplicate { edge }
                    }
                }
            }
            Command::Check {
                source,
                source_handle,
                target,
                target_handle,
                edge_type,
            } => {
                let connection = Connection::new(source, source_handle, target, target_handle);
                StepReport::Checked {
                    result: self.service.check(&connection, edge_type).await,
                }
            }
            Command::Disconnect { edge } => {
                let edge = self.resolve(&edge);
                self.service.disconnect(&edge).await?;
                StepReport::Disconnected { edge }
            }
            Command::Retype { edge, edge_type } => {
                let edge = self.resolve(&edge);
                let applied = self.service.retype_edge(&edge, edge_type).await?;
                StepReport::Retyped { edge, applied }
            }
            Command::DeleteNode { node } => {
                self.service.delete_node(&node).await?;
                StepReport::Deleted { node }
            }
        };
        Ok(report)
    }

    fn resolve(&self, edge: &str) -> EdgeId {
        self.aliases
            .get(edge)
            .cloned()
            .unwrap_or_else(|| EdgeId::from(edge))
    }
}

/// Parse a JSON script
pub fn parse_script(raw: &str) -> Result<Vec<Command>> {
    let commands: Vec<Command> = serde_json::from_str(raw)?;
    if commands.is_empty() {
        bail!("Script contains no commands");
    }
    Ok(commands)
}
