use crate::domain::relation::{CollectionField, ScalarField};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Value object: Node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// Kind of node placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Composite domain node
    Block,
    /// Link between blocks and terminals
    Connector,
    /// Attachment point owned by one block
    Terminal,
    /// Free text annotation
    TextBox,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Block => "block",
            NodeType::Connector => "connector",
            NodeType::Terminal => "terminal",
            NodeType::TextBox => "textbox",
        };
        f.write_str(name)
    }
}

/// Domain classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    /// What the system does
    Function,
    /// What the system is made of
    Product,
    /// Where the system is
    Location,
    /// No aspect, used for annotations
    White,
}

/// Canvas position, carried through untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Entry of a collection relation field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Id of the related node
    pub id: NodeId,
}

impl NodeRef {
    /// Reference the given node
    pub fn new(id: NodeId) -> Self {
        Self { id }
    }
}

/// Payload of a node: display fields plus every relation field.
///
/// Scalar relation fields are either empty or a single node id. Collection
/// relation fields hold `{id}` entries, unique by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub aspect: Aspect,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub terminal_of: Option<NodeId>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub direct_part_of: Option<NodeId>,
    /// Holds the detached sentinel once a Part relation has been torn down
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub transfers_to: Option<NodeId>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub transfered_by: Option<NodeId>,

    #[serde(default, deserialize_with = "refs_or_empty")]
    pub terminals: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub connected_to: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub connected_by: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub direct_parts: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub children: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub fulfilled_by: Vec<NodeRef>,
    #[serde(default, deserialize_with = "refs_or_empty")]
    pub fulfills: Vec<NodeRef>,
}

impl NodeData {
    /// Empty payload for a freshly created node
    pub fn new(label: impl Into<String>, aspect: Aspect) -> Self {
        Self {
            label: label.into(),
            custom_name: None,
            aspect,
            terminal_of: None,
            direct_part_of: None,
            parent: None,
            transfers_to: None,
            transfered_by: None,
            terminals: Vec::new(),
            connected_to: Vec::new(),
            connected_by: Vec::new(),
            direct_parts: Vec::new(),
            children: Vec::new(),
            fulfilled_by: Vec::new(),
            fulfills: Vec::new(),
        }
    }

    /// Current value of a scalar relation field
    pub fn scalar(&self, field: ScalarField) -> Option<&NodeId> {
        match field {
            ScalarField::TerminalOf => self.terminal_of.as_ref(),
            ScalarField::DirectPartOf => self.direct_part_of.as_ref(),
            ScalarField::Parent => self.parent.as_ref(),
            ScalarField::TransfersTo => self.transfers_to.as_ref(),
            ScalarField::TransferedBy => self.transfered_by.as_ref(),
        }
    }

    /// Overwrite a scalar relation field
    pub fn set_scalar(&mut self, field: ScalarField, value: Option<NodeId>) {
        let slot = match field {
            ScalarField::TerminalOf => &mut self.terminal_of,
            ScalarField::DirectPartOf => &mut self.direct_part_of,
            ScalarField::Parent => &mut self.parent,
            ScalarField::TransfersTo => &mut self.transfers_to,
            ScalarField::TransferedBy => &mut self.transfered_by,
        };
        *slot = value;
    }

    /// Entries of a collection relation field
    pub fn collection(&self, field: CollectionField) -> &[NodeRef] {
        match field {
            CollectionField::Terminals => &self.terminals,
            CollectionField::ConnectedTo => &self.connected_to,
            CollectionField::ConnectedBy => &self.connected_by,
            CollectionField::DirectParts => &self.direct_parts,
            CollectionField::Children => &self.children,
            CollectionField::FulfilledBy => &self.fulfilled_by,
            CollectionField::Fulfills => &self.fulfills,
        }
    }

    fn collection_mut(&mut self, field: CollectionField) -> &mut Vec<NodeRef> {
        match field {
            CollectionField::Terminals => &mut self.terminals,
            CollectionField::ConnectedTo => &mut self.connected_to,
            CollectionField::ConnectedBy => &mut self.connected_by,
            CollectionField::DirectParts => &mut self.direct_parts,
            CollectionField::Children => &mut self.children,
            CollectionField::FulfilledBy => &mut self.fulfilled_by,
            CollectionField::Fulfills => &mut self.fulfills,
        }
    }

    /// Append an entry unless one with the same id is already present.
    /// Returns whether the collection changed.
    pub fn append(&mut self, field: CollectionField, id: NodeId) -> bool {
        let entries = self.collection_mut(field);
        if entries.iter().any(|entry| entry.id == id) {
            return false;
        }
        entries.push(NodeRef::new(id));
        true
    }

    /// Remove every entry with the given id. Returns whether the collection changed.
    pub fn remove(&mut self, field: CollectionField, id: &NodeId) -> bool {
        let entries = self.collection_mut(field);
        let before = entries.len();
        entries.retain(|entry| &entry.id != id);
        entries.len() != before
    }
}

/// A node in the model. Matches the canvas node structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    /// Create a node with empty relation fields
    pub fn new(id: NodeId, node_type: NodeType, aspect: Aspect) -> Self {
        let label = format!("{}_{}", node_type, id);
        Self {
            id,
            node_type,
            position: Position::default(),
            data: NodeData::new(label, aspect),
        }
    }

    /// Name shown to the user: the custom name when set, else the id
    pub fn display_name(&self) -> String {
        self.data
            .custom_name
            .clone()
            .unwrap_or_else(|| self.id.0.clone())
    }
}

// Stored payloads use "" for an empty scalar.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.is_empty()).map(NodeId))
}

// Collections may arrive as a single entry or bare id; "" means empty.
fn refs_or_empty<'de, D>(deserializer: D) -> Result<Vec<NodeRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Refs(Vec<NodeRef>),
        Ref(NodeRef),
        Text(String),
    }

    let refs = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Refs(refs)) => refs,
        Some(Raw::Ref(entry)) => vec![entry],
        Some(Raw::Text(id)) if !id.is_empty() => vec![NodeRef::new(NodeId(id))],
        Some(Raw::Text(_)) | None => Vec::new(),
    };
    Ok(refs)
}
