use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use async_trait::async_trait;

use modeler_core::{
    CoreError,
    domain::edge::{Edge, EdgeId},
    domain::node::{Node, NodeId},
    domain::repository::{ChangeSet, EdgeRepository, NodeRepository, UnitOfWork},
};

/// Node and edge tables behind one lock
#[derive(Debug, Clone, Default)]
pub struct ModelTables {
    pub(crate) nodes: HashMap<String, Node>,
    pub(crate) edges: HashMap<String, Edge>,
}

impl ModelTables {
    /// Nodes ordered by id, numeric ids first in numeric order
    pub fn sorted_nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| id_order(&a.id.0, &b.id.0));
        nodes
    }

    /// Edges ordered by id
    pub fn sorted_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        edges
    }

    fn apply(&mut self, changes: ChangeSet) {
        for id in changes.delete_edges {
            self.edges.remove(&id.0);
        }
        for id in changes.delete_nodes {
            self.nodes.remove(&id.0);
        }
        for node in changes.upsert_nodes {
            self.nodes.insert(node.id.0.clone(), node);
        }
        for edge in changes.upsert_edges {
            self.edges.insert(edge.id.0.clone(), edge);
        }
    }

    fn check_edges(&self) -> Result<(), CoreError> {
        for edge in self.edges.values() {
            for endpoint in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(&endpoint.0) {
                    return Err(CoreError::ValidationError(format!(
                        "Edge {} references missing node {}",
                        edge.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

fn id_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// In-memory implementation of the NodeRepository
pub struct InMemoryNodeRepository {
    tables: Arc<RwLock<ModelTables>>,
}

impl InMemoryNodeRepository {
    /// Create a new in-memory node repository
    pub fn new(tables: Arc<RwLock<ModelTables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl NodeRepository for InMemoryNodeRepository {
    async fn find_all(&self) -> Result<Vec<Node>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_nodes())
    }

    async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables.nodes.get(&id.0).cloned())
    }

    async fn create(&self, node: &Node) -> Result<Node, CoreError> {
        let mut tables = self.tables.write().await;
        if tables.nodes.contains_key(&node.id.0) {
            return Err(CoreError::ValidationError(format!(
                "Node {} already exists",
                node.id
            )));
        }
        tables.nodes.insert(node.id.0.clone(), node.clone());
        debug!(node_id = %node.id, "Stored node");
        Ok(node.clone())
    }

    async fn update(&self, node: &Node) -> Result<Node, CoreError> {
        let mut tables = self.tables.write().await;
        match tables.nodes.get_mut(&node.id.0) {
            Some(stored) => {
                *stored = node.clone();
                Ok(node.clone())
            }
            None => Err(CoreError::NodeNotFound(node.id.0.clone())),
        }
    }

    async fn delete(&self, id: &NodeId) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;
        if tables.edges.values().any(|edge| edge.involves(id)) {
            return Err(CoreError::ValidationError(format!(
                "Node {} still has edges",
                id
            )));
        }
        tables.nodes.remove(&id.0);
        Ok(())
    }
}

/// In-memory implementation of the EdgeRepository
pub struct InMemoryEdgeRepository {
    tables: Arc<RwLock<ModelTables>>,
}

impl InMemoryEdgeRepository {
    /// Create a new in-memory edge repository
    pub fn new(tables: Arc<RwLock<ModelTables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl EdgeRepository for InMemoryEdgeRepository {
    async fn find_all(&self) -> Result<Vec<Edge>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_edges())
    }

    async fn find_by_id(&self, id: &EdgeId) -> Result<Option<Edge>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables.edges.get(&id.0).cloned())
    }

    async fn create(&self, edge: &Edge) -> Result<Edge, CoreError> {
        let mut tables = self.tables.write().await;
        for endpoint in [&edge.source, &edge.target] {
            if !tables.nodes.contains_key(&endpoint.0) {
                return Err(CoreError::NodeNotFound(endpoint.0.clone()));
            }
        }
        tables.edges.insert(edge.id.0.clone(), edge.clone());
        Ok(edge.clone())
    }

    async fn update(&self, edge: &Edge) -> Result<Edge, CoreError> {
        let mut tables = self.tables.write().await;
        match tables.edges.get_mut(&edge.id.0) {
            Some(stored) => {
                *stored = edge.clone();
                Ok(edge.clone())
            }
            None => Err(CoreError::EdgeNotFound(edge.id.0.clone())),
        }
    }

    async fn delete(&self, id: &EdgeId) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;
        tables.edges.remove(&id.0);
        Ok(())
    }
}

/// Commits change sets against the shared tables
pub struct InMemoryUnitOfWork {
    tables: Arc<RwLock<ModelTables>>,
}

impl InMemoryUnitOfWork {
    /// Create a new in-memory unit of work
    pub fn new(tables: Arc<RwLock<ModelTables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(&self, changes: ChangeSet) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;

        // Stage on a copy so a rejected change set leaves the tables untouched
        let mut staged = tables.clone();
        let (nodes, edges) = (changes.upsert_nodes.len(), changes.upsert_edges.len());
        staged.apply(changes);

        if let Err(e) = staged.check_edges() {
            warn!(error = %e, "Rejected change set");
            return Err(e);
        }

        *tables = staged;
        debug!(nodes_written = nodes, edges_written = edges, "Committed change set");
        Ok(())
    }
}
