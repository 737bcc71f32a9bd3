use crate::domain::node::{NodeId, NodeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relation fields holding at most one node id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarField {
    TerminalOf,
    DirectPartOf,
    Parent,
    TransfersTo,
    TransferedBy,
}

/// Relation fields holding a set of `{id}` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionField {
    Terminals,
    ConnectedTo,
    ConnectedBy,
    DirectParts,
    Children,
    FulfilledBy,
    Fulfills,
}

/// Relation kinds listed by introspection, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    ConnectedTo,
    ConnectedBy,
    DirectParts,
    FulfilledBy,
    Terminals,
    TerminalOf,
    DirectPartOf,
    TransfersTo,
    TransferedBy,
    Fulfills,
}

/// Where a relation kind is stored on the node payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSlot {
    Scalar(ScalarField),
    Collection(CollectionField),
}

impl RelationKind {
    /// Every listed kind, in display order
    pub const ALL: [RelationKind; 10] = [
        RelationKind::ConnectedTo,
        RelationKind::ConnectedBy,
        RelationKind::DirectParts,
        RelationKind::FulfilledBy,
        RelationKind::Terminals,
        RelationKind::TerminalOf,
        RelationKind::DirectPartOf,
        RelationKind::TransfersTo,
        RelationKind::TransferedBy,
        RelationKind::Fulfills,
    ];

    /// Backing payload field
    pub fn slot(self) -> RelationSlot {
        match self {
            RelationKind::ConnectedTo => RelationSlot::Collection(CollectionField::ConnectedTo),
            RelationKind::ConnectedBy => RelationSlot::Collection(CollectionField::ConnectedBy),
            RelationKind::DirectParts => RelationSlot::Collection(CollectionField::DirectParts),
            RelationKind::FulfilledBy => RelationSlot::Collection(CollectionField::FulfilledBy),
            RelationKind::Terminals => RelationSlot::Collection(CollectionField::Terminals),
            RelationKind::TerminalOf => RelationSlot::Scalar(ScalarField::TerminalOf),
            RelationKind::DirectPartOf => RelationSlot::Scalar(ScalarField::DirectPartOf),
            RelationKind::TransfersTo => RelationSlot::Scalar(ScalarField::TransfersTo),
            RelationKind::TransferedBy => RelationSlot::Scalar(ScalarField::TransferedBy),
            RelationKind::Fulfills => RelationSlot::Collection(CollectionField::Fulfills),
        }
    }

    /// Human readable label for side panels
    pub fn label(self) -> &'static str {
        match self {
            RelationKind::DirectParts => "Parts",
            RelationKind::ConnectedTo => "Connected to",
            RelationKind::ConnectedBy => "Connected by",
            RelationKind::FulfilledBy => "Fulfilled by",
            RelationKind::Terminals => "Terminals",
            RelationKind::TerminalOf => "Terminal of",
            RelationKind::DirectPartOf => "Part of",
            RelationKind::TransfersTo => "Transfers to",
            RelationKind::TransferedBy => "Transfered by",
            RelationKind::Fulfills => "Fulfills",
        }
    }
}

/// Relation delta for a single node, produced by the connection policy.
///
/// `relation` overwrites scalar fields, `relations` appends one entry per
/// collection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRelation {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relation: BTreeMap<ScalarField, NodeId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<CollectionField, NodeRef>,
}

impl NodeRelation {
    /// Empty delta addressed to `node_id`
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            relation: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Queue a scalar assignment
    pub fn set(mut self, field: ScalarField, value: NodeId) -> Self {
        self.relation.insert(field, value);
        self
    }

    /// Queue a collection append
    pub fn append(mut self, field: CollectionField, value: NodeId) -> Self {
        self.relations.insert(field, NodeRef::new(value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_labels() {
        assert_eq!(RelationKind::DirectParts.label(), "Parts");
        assert_eq!(RelationKind::DirectPartOf.label(), "Part of");
        assert_eq!(RelationKind::TransferedBy.label(), "Transfered by");
    }

    #[test]
    fn test_every_kind_has_a_distinct_slot() {
        let mut slots = Vec::new();
        for kind in RelationKind::ALL {
            let slot = kind.slot();
            assert!(!slots.contains(&slot), "{:?} shares a slot", kind);
            slots.push(slot);
        }
    }

    #[test]
    fn test_node_relation_wire_shape() {
        let delta = NodeRelation::new(NodeId::from("A"))
            .append(CollectionField::Terminals, NodeId::from("B"));
        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            value,
            json!({ "nodeId": "A", "relations": { "terminals": { "id": "B" } } })
        );

        let delta = NodeRelation::new(NodeId::from("B")).set(ScalarField::TerminalOf, NodeId::from("A"));
        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(value, json!({ "nodeId": "B", "relation": { "terminalOf": "A" } }));
    }
}
