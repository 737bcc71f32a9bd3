use crate::domain::edge::EdgeType;
use crate::domain::node::NodeId;
use crate::domain::relation::{CollectionField, ScalarField};
use crate::domain::store::{NodeSet, StagedNodes};
use crate::error::Rejection;

/// Convert the relation between `source` and `target` from `from` to `to`.
///
/// Only Part to Fulfilled and Fulfilled to Part are supported. The source
/// of a Part relation is the part, the target is the whole.
pub fn retype(
    nodes: &NodeSet,
    source: &NodeId,
    target: &NodeId,
    from: EdgeType,
    to: EdgeType,
    detached_parent: &NodeId,
) -> Result<StagedNodes, Rejection> {
    if from.retyped() != Some(to) {
        return Err(Rejection::UnsupportedRetype { from, to });
    }

    let (Some(source_node), Some(_)) = (nodes.get(source), nodes.get(target)) else {
        return Err(Rejection::NodesMissing);
    };

    let mut staged = StagedNodes::new(nodes);

    match from {
        EdgeType::Part => {
            staged.update(target, |data| {
                data.remove(CollectionField::DirectParts, source);
                data.remove(CollectionField::Children, source);
                data.append(CollectionField::FulfilledBy, source.clone());
            });
            staged.update(source, |data| {
                data.set_scalar(ScalarField::DirectPartOf, None);
                data.set_scalar(ScalarField::Parent, Some(detached_parent.clone()));
                data.append(CollectionField::Fulfills, target.clone());
            });
        }
        EdgeType::Fulfilled => {
            if let Some(parent) = source_node
                .data
                .direct_part_of
                .as_ref()
                .filter(|parent| *parent != target)
            {
                return Err(Rejection::AlreadyPartOf {
                    node: nodes.display_name(source),
                    parent: nodes.display_name(parent),
                });
            }

            staged.update(target, |data| {
                data.remove(CollectionField::FulfilledBy, source);
                data.append(CollectionField::DirectParts, source.clone());
                data.append(CollectionField::Children, source.clone());
            });
            staged.update(source, |data| {
                data.remove(CollectionField::Fulfills, target);
                data.set_scalar(ScalarField::Parent, Some(target.clone()));
                data.set_scalar(ScalarField::DirectPartOf, Some(target.clone()));
            });
        }
        EdgeType::Connected | EdgeType::Transfer => {
            return Err(Rejection::UnsupportedRetype { from, to });
        }
    }

    Ok(staged)
}
