//! Repository traits for the modeler core
//!
//! The relation engine never talks to storage directly. It loads the model
//! through [`NodeRepository`] and [`EdgeRepository`] and hands every write
//! caused by one editing gesture to a [`UnitOfWork`] as a single
//! [`ChangeSet`].

use async_trait::async_trait;

use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};
use crate::CoreError;

/// Repository for nodes
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Load every node
    async fn find_all(&self) -> Result<Vec<Node>, CoreError>;

    /// Find a node by ID
    async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, CoreError>;

    /// Persist a new node
    async fn create(&self, node: &Node) -> Result<Node, CoreError>;

    /// Replace a stored node
    async fn update(&self, node: &Node) -> Result<Node, CoreError>;

    /// Delete a node
    async fn delete(&self, id: &NodeId) -> Result<(), CoreError>;
}

/// Repository for edges
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Load every edge
    async fn find_all(&self) -> Result<Vec<Edge>, CoreError>;

    /// Find an edge by ID
    async fn find_by_id(&self, id: &EdgeId) -> Result<Option<Edge>, CoreError>;

    /// Persist a new edge
    async fn create(&self, edge: &Edge) -> Result<Edge, CoreError>;

    /// Replace a stored edge
    async fn update(&self, edge: &Edge) -> Result<Edge, CoreError>;

    /// Delete an edge
    async fn delete(&self, id: &EdgeId) -> Result<(), CoreError>;
}

/// Every write produced by one editing gesture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub upsert_nodes: Vec<Node>,
    pub delete_nodes: Vec<NodeId>,
    pub upsert_edges: Vec<Edge>,
    pub delete_edges: Vec<EdgeId>,
}

impl ChangeSet {
    /// Empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace nodes
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.upsert_nodes.extend(nodes);
        self
    }

    /// Add or replace an edge
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.upsert_edges.push(edge);
        self
    }

    /// Remove an edge
    pub fn without_edge(mut self, id: EdgeId) -> Self {
        self.delete_edges.push(id);
        self
    }

    /// Remove a node
    pub fn without_node(mut self, id: NodeId) -> Self {
        self.delete_nodes.push(id);
        self
    }

    /// Whether the change set writes nothing
    pub fn is_empty(&self) -> bool {
        self.upsert_nodes.is_empty()
            && self.delete_nodes.is_empty()
            && self.upsert_edges.is_empty()
            && self.delete_edges.is_empty()
    }
}

/// Applies a change set all-or-nothing
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Commit every write in `changes`, or none of them
    async fn commit(&self, changes: ChangeSet) -> Result<(), CoreError>;
}

/// Memory implementations for testing
#[cfg(any(test, feature = "testing"))]
pub mod memory {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    /// In-memory node and edge store backed by concurrent maps.
    ///
    /// Commits are applied entry by entry; use `modeler-state-inmemory`
    /// when atomic commits matter.
    #[derive(Clone)]
    pub struct MemoryModelRepository {
        nodes: Arc<DashMap<String, Node>>,
        edges: Arc<DashMap<String, Edge>>,
    }

    impl MemoryModelRepository {
        /// Create an empty repository
        pub fn new() -> Self {
            Self {
                nodes: Arc::new(DashMap::with_capacity(64)),
                edges: Arc::new(DashMap::with_capacity(64)),
            }
        }

        /// Create a repository holding the given model
        pub fn with_model(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
            let repo = Self::new();
            for node in nodes {
                repo.nodes.insert(node.id.0.clone(), node);
            }
            for edge in edges {
                repo.edges.insert(edge.id.0.clone(), edge);
            }
            repo
        }
    }

    impl Default for MemoryModelRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl NodeRepository for MemoryModelRepository {
        async fn find_all(&self) -> Result<Vec<Node>, CoreError> {
            let mut nodes: Vec<Node> = self.nodes.iter().map(|entry| entry.value().clone()).collect();
            nodes.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(nodes)
        }

        async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>, CoreError> {
            Ok(self.nodes.get(&id.0).map(|node| node.clone()))
        }

        async fn create(&self, node: &Node) -> Result<Node, CoreError> {
            if self.nodes.contains_key(&node.id.0) {
                return Err(CoreError::ValidationError(format!(
                    "Node {} already exists",
                    node.id
                )));
            }
            self.nodes.insert(node.id.0.clone(), node.clone());
            Ok(node.clone())
        }

        async fn update(&self, node: &Node) -> Result<Node, CoreError> {
            match self.nodes.get_mut(&node.id.0) {
                Some(mut stored) => {
                    *stored = node.clone();
                    Ok(node.clone())
                }
                None => Err(CoreError::NodeNotFound(node.id.0.clone())),
            }
        }

        async fn delete(&self, id: &NodeId) -> Result<(), CoreError> {
            self.nodes.remove(&id.0);
            Ok(())
        }
    }

    #[async_trait]
    impl EdgeRepository for MemoryModelRepository {
        async fn find_all(&self) -> Result<Vec<Edge>, CoreError> {
            let mut edges: Vec<Edge> = self.edges.iter().map(|entry| entry.value().clone()).collect();
            edges.sort_by(|a, b| a.id.0.cmp(&b.id.0));
            Ok(edges)
        }

        async fn find_by_id(&self, id: &EdgeId) -> Result<Option<Edge>, CoreError> {
            Ok(self.edges.get(&id.0).map(|edge| edge.clone()))
        }

        async fn create(&self, edge: &Edge) -> Result<Edge, CoreError> {
            self.edges.insert(edge.id.0.clone(), edge.clone());
            Ok(edge.clone())
        }

        async fn update(&self, edge: &Edge) -> Result<Edge, CoreError> {
            match self.edges.get_mut(&edge.id.0) {
                Some(mut stored) => {
                    *stored = edge.clone();
                    Ok(edge.clone())
                }
                None => Err(CoreError::EdgeNotFound(edge.id.0.clone())),
            }
        }

        async fn delete(&self, id: &EdgeId) -> Result<(), CoreError> {
            self.edges.remove(&id.0);
            Ok(())
        }
    }

    #[async_trait]
    impl UnitOfWork for MemoryModelRepository {
        async fn commit(&self, changes: ChangeSet) -> Result<(), CoreError> {
            for id in &changes.delete_edges {
                self.edges.remove(&id.0);
            }
            for id in &changes.delete_nodes {
                self.nodes.remove(&id.0);
            }
            for node in changes.upsert_nodes {
                self.nodes.insert(node.id.0.clone(), node);
            }
            for edge in changes.upsert_edges {
                self.edges.insert(edge.id.0.clone(), edge);
            }
            Ok(())
        }
    }
}
