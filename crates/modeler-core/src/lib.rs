//!
//! Modeler Core - relation-consistency engine for the modeling graph
//!
//! Nodes (blocks, connectors, terminals, textboxes) carry denormalized
//! relation fields that mirror the edges between them. This crate decides
//! which connections are legal, derives the relation writes an edge implies,
//! and removes or converts them again, keeping both endpoints of every
//! relation in agreement.

#![forbid(unsafe_code)]

/// Domain layer - nodes, edges, and the relation rules
pub mod domain;

/// Application services - editing gestures over persisted models
pub mod application;

/// Engine configuration
pub mod config;

/// User-facing notification channel
pub mod notification;

/// Error types
pub mod error;

// Re-export key types
pub use config::EngineConfig;
pub use error::{CoreError, Rejection};
pub use notification::{ChannelNotifier, Notifier, TracingNotifier};

// Re-export main API types for easy use
pub use application::model_service::{ConnectOutcome, ModelService};
pub use domain::edge::{Edge, EdgeData, EdgeId, EdgeType};
pub use domain::handle::{Connection, Endpoint, HandleId, HandleRole};
pub use domain::introspection::{node_relations, RelationListing};
pub use domain::materializer::{apply_relations, Materialized};
pub use domain::node::{Aspect, Node, NodeData, NodeId, NodeRef, NodeType, Position};
pub use domain::policy::{check_connection, evaluate, ConnectionCheck, ConnectionPlan};
pub use domain::relation::{CollectionField, NodeRelation, RelationKind, ScalarField};
pub use domain::repository::{ChangeSet, EdgeRepository, NodeRepository, UnitOfWork};
pub use domain::retype::retype;
pub use domain::store::{edge_difference, removed_edges, NodeSet, StagedNodes};
pub use domain::teardown::{teardown, teardown_into};
