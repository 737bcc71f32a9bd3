use crate::domain::handle::{Connection, HandleId, HandleRole};
use crate::domain::node::NodeId;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Value object: Edge ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new random edge ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        EdgeId(id.to_string())
    }
}

/// Semantic type of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Structural composition
    Part,
    /// Generic link
    Connected,
    /// Non-exclusive satisfies-relation
    Fulfilled,
    /// Terminal-to-terminal flow
    Transfer,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeType::Part => "Part",
            EdgeType::Connected => "Connected",
            EdgeType::Fulfilled => "Fulfilled",
            EdgeType::Transfer => "Transfer",
        };
        f.write_str(name)
    }
}

impl FromStr for EdgeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "part" => Ok(EdgeType::Part),
            "connected" => Ok(EdgeType::Connected),
            "fulfilled" => Ok(EdgeType::Fulfilled),
            "transfer" => Ok(EdgeType::Transfer),
            other => Err(CoreError::ValidationError(format!(
                "Unknown edge type: {}",
                other
            ))),
        }
    }
}

impl EdgeType {
    /// Type an edge of this type can be converted into
    pub fn retyped(self) -> Option<EdgeType> {
        match self {
            EdgeType::Part => Some(EdgeType::Fulfilled),
            EdgeType::Fulfilled => Some(EdgeType::Part),
            EdgeType::Connected | EdgeType::Transfer => None,
        }
    }
}

/// Edge payload recorded at creation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    /// Set when the edge was derived structurally; its type is then fixed
    #[serde(default)]
    pub lock_connection: bool,
}

/// An edge in the model. Matches the canvas edge structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: HandleId,
    pub target_handle: HandleId,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    /// Build the edge persisted for an accepted connection
    pub fn from_connection(
        id: EdgeId,
        connection: &Connection,
        edge_type: EdgeType,
        lock_connection: bool,
    ) -> Self {
        Self {
            id,
            edge_type,
            source: connection.source.node.clone(),
            target: connection.target.node.clone(),
            source_handle: connection.source.handle.clone(),
            target_handle: connection.target.handle.clone(),
            data: EdgeData { lock_connection },
        }
    }

    /// Whether this edge touches the node
    pub fn involves(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }

    /// Whether the edge type is fixed
    pub fn is_locked(&self) -> bool {
        self.data.lock_connection
    }

    /// Endpoint roles, classified from the stored handle ids
    pub fn roles(&self) -> (Option<HandleRole>, Option<HandleRole>) {
        (self.source_handle.role(), self.target_handle.role())
    }
}
