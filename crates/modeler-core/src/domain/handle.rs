//! Connection endpoints and the roles their handles play.
//!
//! Handle ids encode the structural role of an endpoint (`block-r`,
//! `terminal-2`, ...). The substring predicates below are the boundary
//! adapter: a [`Connection`] classifies each handle exactly once, and the
//! policy engine only ever looks at the resulting [`HandleRole`].

use crate::domain::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

const BLOCK_MARKER: &str = "block";
const CONNECTOR_MARKER: &str = "connector";
const TERMINAL_MARKER: &str = "terminal";
const TEXTBOX_MARKER: &str = "textbox";

/// Handle sits on a block
pub fn is_block(handle: &str) -> bool {
    handle.contains(BLOCK_MARKER)
}

/// Handle sits on a connector
pub fn is_connector(handle: &str) -> bool {
    handle.contains(CONNECTOR_MARKER)
}

/// Handle sits on a terminal
pub fn is_terminal(handle: &str) -> bool {
    handle.contains(TERMINAL_MARKER)
}

/// Handle sits on a textbox
pub fn is_textbox(handle: &str) -> bool {
    handle.contains(TEXTBOX_MARKER)
}

/// Structural role of a connection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleRole {
    Block,
    Connector,
    Terminal,
    TextBox,
}

impl HandleRole {
    /// Classify a handle id. Ids matching no marker, or more than one, have no role.
    pub fn classify(handle: &str) -> Option<Self> {
        let matches = [
            (is_block(handle), HandleRole::Block),
            (is_connector(handle), HandleRole::Connector),
            (is_terminal(handle), HandleRole::Terminal),
            (is_textbox(handle), HandleRole::TextBox),
        ];

        let mut roles = matches.iter().filter(|(hit, _)| *hit).map(|(_, role)| *role);
        match (roles.next(), roles.next()) {
            (Some(role), None) => Some(role),
            (None, _) => None,
            (Some(_), Some(_)) => {
                tracing::debug!(handle, "Handle id names more than one role");
                None
            }
        }
    }

    /// Marker used when building handle ids for this role
    pub fn marker(self) -> &'static str {
        match self {
            HandleRole::Block => BLOCK_MARKER,
            HandleRole::Connector => CONNECTOR_MARKER,
            HandleRole::Terminal => TERMINAL_MARKER,
            HandleRole::TextBox => TEXTBOX_MARKER,
        }
    }
}

/// Value object: Handle ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub String);

impl HandleId {
    /// Handle id for `slot` on a node playing `role`, e.g. `block-r`
    pub fn for_role(role: HandleRole, slot: &str) -> Self {
        Self(format!("{}-{}", role.marker(), slot))
    }

    /// Role encoded in this handle id
    pub fn role(&self) -> Option<HandleRole> {
        HandleRole::classify(&self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandleId {
    fn from(id: &str) -> Self {
        HandleId(id.to_string())
    }
}

/// One side of a proposed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node: NodeId,
    pub handle: HandleId,
    pub role: Option<HandleRole>,
}

impl Endpoint {
    /// Endpoint with its role classified from the handle id
    pub fn new(node: NodeId, handle: HandleId) -> Self {
        let role = handle.role();
        Self { node, handle, role }
    }

    /// Whether this endpoint plays `role`
    pub fn is(&self, role: HandleRole) -> bool {
        self.role == Some(role)
    }
}

/// A connection dragged between two handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Connection {
    /// Classify both handles of a raw connection gesture
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: impl Into<HandleId>,
        target: impl Into<NodeId>,
        target_handle: impl Into<HandleId>,
    ) -> Self {
        Self {
            source: Endpoint::new(source.into(), source_handle.into()),
            target: Endpoint::new(target.into(), target_handle.into()),
        }
    }

    /// Whether source and target are the same node
    pub fn is_self_loop(&self) -> bool {
        self.source.node == self.target.node
    }

    /// Roles of both endpoints as (source, target)
    pub fn roles(&self) -> (Option<HandleRole>, Option<HandleRole>) {
        (self.source.role, self.target.role)
    }
}
