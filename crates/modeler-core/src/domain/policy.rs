//! Connection policy: decides whether a dragged connection is legal, which
//! edge type it gets, whether it is locked, and which relation fields must
//! be written on each endpoint.
//!
//! Structural rules are selected by the endpoint roles:
//!
//! | source    | target    | result                                        |
//! |-----------|-----------|-----------------------------------------------|
//! | block     | terminal  | locked Connected, `terminalOf` / `terminals`   |
//! | terminal  | block     | locked Connected, `terminalOf` / `terminals`   |
//! | connector | block     | locked Connected, `connectedTo` / `connectedBy`|
//! | block     | connector | locked Connected, `connectedTo` / `connectedBy`|
//! | terminal  | terminal  | locked Transfer, `transfersTo` / `transferedBy`|
//! | terminal  | connector | locked Connected, `connectedTo` / `connectedBy`|
//! | connector | terminal  | locked Connected, `connectedTo` / `connectedBy`|
//!
//! Any other pair keeps the caller's edge type. Between two blocks Part and
//! Fulfilled write their relations; everything else is a plain edge with no
//! relation side effects.

use crate::domain::edge::EdgeType;
use crate::domain::handle::{Connection, HandleRole};
use crate::domain::node::NodeId;
use crate::domain::relation::{CollectionField, NodeRelation, ScalarField};
use crate::domain::store::NodeSet;
use crate::error::Rejection;
use crate::notification::Notifier;
use serde::Serialize;

/// Outcome of an accepted connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub connection_type: EdgeType,
    pub lock_connection: bool,
    pub new_node_relations: Vec<NodeRelation>,
}

impl ConnectionPlan {
    fn plain(edge_type: EdgeType) -> Self {
        Self {
            connection_type: edge_type,
            lock_connection: false,
            new_node_relations: Vec::new(),
        }
    }

    fn locked(edge_type: EdgeType, new_node_relations: Vec<NodeRelation>) -> Self {
        Self {
            connection_type: edge_type,
            lock_connection: true,
            new_node_relations,
        }
    }

    /// Whether accepting the connection writes any relation field
    pub fn has_relations(&self) -> bool {
        !self.new_node_relations.is_empty()
    }
}

/// Legality report in the shape the canvas consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub can_connect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<EdgeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_connection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_node_relations: Option<Vec<NodeRelation>>,
}

impl From<ConnectionPlan> for ConnectionCheck {
    fn from(plan: ConnectionPlan) -> Self {
        Self {
            can_connect: true,
            connection_type: Some(plan.connection_type),
            lock_connection: Some(plan.lock_connection),
            new_node_relations: Some(plan.new_node_relations),
        }
    }
}

impl ConnectionCheck {
    fn rejected() -> Self {
        Self {
            can_connect: false,
            connection_type: None,
            lock_connection: None,
            new_node_relations: None,
        }
    }
}

/// Evaluate a proposed connection against the current nodes.
///
/// `edge_type` is the caller-selected default; structural rules override it.
/// No node is modified, the returned plan lists the relation writes.
pub fn evaluate(
    connection: &Connection,
    edge_type: EdgeType,
    nodes: &NodeSet,
) -> Result<ConnectionPlan, Rejection> {
    if connection.is_self_loop() {
        return Err(Rejection::SelfConnection);
    }

    let source = &connection.source.node;
    let target = &connection.target.node;

    use HandleRole::*;
    match connection.roles() {
        (Some(Block), Some(Terminal)) => terminal_ownership(target, source, nodes),
        (Some(Terminal), Some(Block)) => terminal_ownership(source, target, nodes),
        (Some(Connector), Some(Block))
        | (Some(Block), Some(Connector))
        | (Some(Terminal), Some(Connector))
        | (Some(Connector), Some(Terminal)) => Ok(connected_link(source, target)),
        (Some(Terminal), Some(Terminal)) => transfer(source, target, nodes),
        (Some(Block), Some(Block)) => block_relation(source, target, edge_type, nodes),
        _ => Ok(ConnectionPlan::plain(edge_type)),
    }
}

/// Evaluate a connection and report a rejection through `notifier`.
pub fn check_connection(
    connection: &Connection,
    edge_type: EdgeType,
    nodes: &NodeSet,
    notifier: &dyn Notifier,
) -> ConnectionCheck {
    match evaluate(connection, edge_type, nodes) {
        Ok(plan) => plan.into(),
        Err(rejection) => {
            tracing::warn!(
                source = %connection.source.node,
                target = %connection.target.node,
                reason = %rejection,
                "Connection rejected"
            );
            notifier.notify(&rejection.to_string());
            ConnectionCheck::rejected()
        }
    }
}

fn terminal_ownership(
    terminal: &NodeId,
    block: &NodeId,
    nodes: &NodeSet,
) -> Result<ConnectionPlan, Rejection> {
    if let Some(owner) = nodes.get(terminal).and_then(|node| node.data.terminal_of.as_ref()) {
        return Err(Rejection::TerminalAlreadyOwned {
            terminal: nodes.display_name(terminal),
            owner: nodes.display_name(owner),
        });
    }

    Ok(ConnectionPlan::locked(
        EdgeType::Connected,
        vec![
            NodeRelation::new(terminal.clone()).set(ScalarField::TerminalOf, block.clone()),
            NodeRelation::new(block.clone()).append(CollectionField::Terminals, terminal.clone()),
        ],
    ))
}

fn connected_link(source: &NodeId, target: &NodeId) -> ConnectionPlan {
    ConnectionPlan::locked(
        EdgeType::Connected,
        vec![
            NodeRelation::new(source.clone()).append(CollectionField::ConnectedTo, target.clone()),
            NodeRelation::new(target.clone()).append(CollectionField::ConnectedBy, source.clone()),
        ],
    )
}

fn transfer(source: &NodeId, target: &NodeId, nodes: &NodeSet) -> Result<ConnectionPlan, Rejection> {
    if nodes
        .get(target)
        .is_some_and(|node| node.data.transfered_by.is_some())
    {
        return Err(Rejection::TargetAlreadyTransferred {
            terminal: nodes.display_name(target),
        });
    }

    if nodes
        .get(source)
        .is_some_and(|node| node.data.transfers_to.is_some())
    {
        return Err(Rejection::SourceAlreadyTransferring {
            terminal: nodes.display_name(source),
        });
    }

    Ok(ConnectionPlan::locked(
        EdgeType::Transfer,
        vec![
            NodeRelation::new(source.clone()).set(ScalarField::TransfersTo, target.clone()),
            NodeRelation::new(target.clone()).set(ScalarField::TransferedBy, source.clone()),
        ],
    ))
}

fn block_relation(
    source: &NodeId,
    target: &NodeId,
    edge_type: EdgeType,
    nodes: &NodeSet,
) -> Result<ConnectionPlan, Rejection> {
    match edge_type {
        EdgeType::Part => {
            if let Some(parent) = nodes
                .get(source)
                .and_then(|node| node.data.direct_part_of.as_ref())
            {
                return Err(Rejection::AlreadyPartOf {
                    node: nodes.display_name(source),
                    parent: nodes.display_name(parent),
                });
            }

            Ok(ConnectionPlan {
                connection_type: EdgeType::Part,
                lock_connection: false,
                new_node_relations: vec![
                    NodeRelation::new(target.clone())
                        .append(CollectionField::DirectParts, source.clone())
                        .append(CollectionField::Children, source.clone()),
                    NodeRelation::new(source.clone())
                        .set(ScalarField::Parent, target.clone())
                        .set(ScalarField::DirectPartOf, target.clone()),
                ],
            })
        }
        EdgeType::Fulfilled => Ok(ConnectionPlan {
            connection_type: EdgeType::Fulfilled,
            lock_connection: false,
            new_node_relations: vec![
                NodeRelation::new(source.clone()).append(CollectionField::Fulfills, target.clone()),
                NodeRelation::new(target.clone()).append(CollectionField::FulfilledBy, source.clone()),
            ],
        }),
        other => Ok(ConnectionPlan::plain(other)),
    }
}
