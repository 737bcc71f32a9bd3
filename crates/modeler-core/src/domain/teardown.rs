//! Reverse of the connection policy: clears the relation fields an edge
//! established when that edge is removed.

use crate::domain::edge::{Edge, EdgeType};
use crate::domain::handle::HandleRole;
use crate::domain::node::{NodeData, NodeId};
use crate::domain::relation::{CollectionField, ScalarField};
use crate::domain::store::{NodeSet, StagedNodes};

/// Clear the relation fields held for `edge` on a copy of `nodes`.
///
/// `deleting` names a node that is being removed together with the edge;
/// its own fields are left alone. Parts that lose their parent get
/// `detached_parent` as their `parent`.
pub fn teardown(
    nodes: &NodeSet,
    edge: &Edge,
    deleting: Option<&NodeId>,
    detached_parent: &NodeId,
) -> StagedNodes {
    let mut staged = StagedNodes::new(nodes);
    teardown_into(&mut staged, edge, deleting, detached_parent);
    staged
}

/// Same as [`teardown`], accumulating into an existing staging area
pub fn teardown_into(
    staged: &mut StagedNodes,
    edge: &Edge,
    deleting: Option<&NodeId>,
    detached_parent: &NodeId,
) {
    let source = &edge.source;
    let target = &edge.target;

    if !staged.nodes().contains(source) || !staged.nodes().contains(target) {
        tracing::debug!(edge_id = %edge.id, "Edge endpoint missing, nothing to tear down");
        return;
    }

    let mut scope = Scope { staged, deleting };

    use HandleRole::*;
    match edge.roles() {
        (Some(Terminal), Some(Terminal)) => {
            scope.edit(target, |data| data.set_scalar(ScalarField::TransferedBy, None));
            scope.edit(source, |data| data.set_scalar(ScalarField::TransfersTo, None));
        }
        (Some(Terminal), Some(Block)) => scope.release_terminal(source, target),
        (Some(Block), Some(Terminal)) => scope.release_terminal(target, source),
        roles => match edge.edge_type {
            EdgeType::Connected => {
                scope.edit(source, |data| {
                    data.remove(CollectionField::ConnectedTo, target);
                });
                scope.edit(target, |data| {
                    data.remove(CollectionField::ConnectedBy, source);
                });
            }
            EdgeType::Part if roles == (Some(Block), Some(Block)) => {
                scope.edit(target, |data| {
                    data.remove(CollectionField::DirectParts, source);
                    data.remove(CollectionField::Children, source);
                });
                scope.edit(source, |data| {
                    data.set_scalar(ScalarField::DirectPartOf, None);
                    data.set_scalar(ScalarField::Parent, Some(detached_parent.clone()));
                });
            }
            EdgeType::Fulfilled if roles == (Some(Block), Some(Block)) => {
                scope.edit(source, |data| {
                    data.remove(CollectionField::Fulfills, target);
                });
                scope.edit(target, |data| {
                    data.remove(CollectionField::FulfilledBy, source);
                });
            }
            _ => {}
        },
    }
}

struct Scope<'a> {
    staged: &'a mut StagedNodes,
    deleting: Option<&'a NodeId>,
}

impl Scope<'_> {
    fn edit<F>(&mut self, id: &NodeId, edit: F)
    where
        F: FnOnce(&mut NodeData),
    {
        if Some(id) != self.deleting {
            self.staged.update(id, edit);
        }
    }

    fn release_terminal(&mut self, terminal: &NodeId, block: &NodeId) {
        self.edit(terminal, |data| data.set_scalar(ScalarField::TerminalOf, None));
        self.edit(block, |data| {
            data.remove(CollectionField::Terminals, terminal);
        });
    }
}
