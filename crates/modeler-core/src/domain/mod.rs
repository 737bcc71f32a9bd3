/// Node model and relation fields
pub mod node;

/// Edge model
pub mod edge;

/// Handle roles and connection endpoints
pub mod handle;

/// Relation field identifiers and deltas
pub mod relation;

/// Immutable node collection and staging
pub mod store;

/// Connection policy engine
pub mod policy;

/// Relation delta application
pub mod materializer;

/// Relation removal
pub mod teardown;

/// Part and Fulfilled conversion
pub mod retype;

/// Relation listings for display
pub mod introspection;

/// Repository interfaces
pub mod repository;
