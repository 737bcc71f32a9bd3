//! In-memory model store for the modeler engine
//!
//! This crate provides in-memory implementations of the repository
//! interfaces defined in the modeler-core crate. All repositories handed out
//! by one provider share the same tables, and change sets are committed
//! under a single write lock.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub mod repositories;
pub use repositories::{InMemoryEdgeRepository, InMemoryNodeRepository, InMemoryUnitOfWork, ModelTables};

use modeler_core::{
    domain::edge::Edge,
    domain::node::Node,
    domain::repository::{EdgeRepository, NodeRepository, UnitOfWork},
    CoreError,
};

/// Serializable node and edge lists, the shape models are exchanged in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl ModelSnapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Render the snapshot as pretty JSON
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Repositories created by [`InMemoryStateStoreProvider::create_repositories`]
pub type Repositories = (
    Arc<dyn NodeRepository>,
    Arc<dyn EdgeRepository>,
    Arc<dyn UnitOfWork>,
);

/// Provider for in-memory model repositories
pub struct InMemoryStateStoreProvider {
    // Shared storage for nodes and edges
    tables: Arc<RwLock<ModelTables>>,
}

impl InMemoryStateStoreProvider {
    /// Create a provider with an empty model
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(ModelTables::default())),
        }
    }

    /// Create a provider seeded with a model.
    ///
    /// Edges whose endpoints are not in the snapshot are refused.
    pub fn with_model(snapshot: ModelSnapshot) -> Result<Self, CoreError> {
        let mut tables = ModelTables::default();
        for node in snapshot.nodes {
            tables.nodes.insert(node.id.0.clone(), node);
        }
        for edge in snapshot.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !tables.nodes.contains_key(&endpoint.0) {
                    return Err(CoreError::ValidationError(format!(
                        "Edge {} references missing node {}",
                        edge.id, endpoint
                    )));
                }
            }
            tables.edges.insert(edge.id.0.clone(), edge);
        }

        info!(
            nodes = tables.nodes.len(),
            edges = tables.edges.len(),
            "Seeded in-memory model"
        );
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Create repositories for use with the model service
    pub fn create_repositories(&self) -> Repositories {
        let node_repo = Arc::new(InMemoryNodeRepository::new(self.tables.clone()));
        let edge_repo = Arc::new(InMemoryEdgeRepository::new(self.tables.clone()));
        let unit_of_work = Arc::new(InMemoryUnitOfWork::new(self.tables.clone()));

        (node_repo, edge_repo, unit_of_work)
    }

    /// Current contents of the store
    pub async fn snapshot(&self) -> ModelSnapshot {
        let tables = self.tables.read().await;
        ModelSnapshot {
            nodes: tables.sorted_nodes(),
            edges: tables.sorted_edges(),
        }
    }
}

impl Default for InMemoryStateStoreProvider {
    fn default() -> Self {
        Self::new()
    }
}
