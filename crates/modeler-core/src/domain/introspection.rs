use crate::domain::node::{NodeData, NodeRef};
use crate::domain::relation::{RelationKind, RelationSlot};
use serde::Serialize;

/// One populated relation of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationListing {
    pub key: RelationKind,
    pub children: Vec<NodeRef>,
}

impl RelationListing {
    /// Display label of the relation kind
    pub fn label(&self) -> &'static str {
        self.key.label()
    }
}

/// List every non-empty relation of a node in display order.
/// Scalar relations become one-element lists.
pub fn node_relations(data: &NodeData) -> Vec<RelationListing> {
    RelationKind::ALL
        .iter()
        .filter_map(|&key| {
            let children = match key.slot() {
                RelationSlot::Scalar(field) => data
                    .scalar(field)
                    .map(|id| vec![NodeRef::new(id.clone())])
                    .unwrap_or_default(),
                RelationSlot::Collection(field) => data.collection(field).to_vec(),
            };
            (!children.is_empty()).then_some(RelationListing { key, children })
        })
        .collect()
}
