use crate::domain::node::NodeId;
use crate::domain::relation::NodeRelation;
use crate::domain::store::{NodeSet, StagedNodes};

/// Result of applying a relation-delta sequence
#[derive(Debug, Clone)]
pub struct Materialized {
    pub staged: StagedNodes,
    /// Node whose delta could not be applied because it does not exist.
    /// Deltas after it were not applied either.
    pub aborted_at: Option<NodeId>,
}

impl Materialized {
    /// Whether every delta was applied
    pub fn is_complete(&self) -> bool {
        self.aborted_at.is_none()
    }
}

/// Apply relation deltas to a copy of `nodes`, in order.
///
/// Scalar entries overwrite the field. Collection entries are appended
/// unless an entry with the same id is already present.
pub fn apply_relations(nodes: &NodeSet, deltas: &[NodeRelation]) -> Materialized {
    let mut staged = StagedNodes::new(nodes);

    for delta in deltas {
        let found = staged.update(&delta.node_id, |data| {
            for (field, value) in &delta.relation {
                data.set_scalar(*field, Some(value.clone()));
            }
            for (field, entry) in &delta.relations {
                data.append(*field, entry.id.clone());
            }
        });

        if !found {
            tracing::debug!(node_id = %delta.node_id, "Relation target missing, abandoning remaining deltas");
            return Materialized {
                staged,
                aborted_at: Some(delta.node_id.clone()),
            };
        }
    }

    Materialized {
        staged,
        aborted_at: None,
    }
}
