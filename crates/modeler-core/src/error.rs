use crate::domain::edge::EdgeType;
use thiserror::Error;

/// Core error type for the modeler engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Input/output error
    #[error("Input/output error: {0}")]
    IOError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Reasons the connection policy refuses a gesture.
///
/// The display string of each variant is the message shown to the user
/// through the notification channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Source and target are the same node
    #[error("Cannot connect node to itself")]
    SelfConnection,

    /// The terminal already belongs to a block
    #[error("Terminal {terminal} is already a terminal of {owner}")]
    TerminalAlreadyOwned {
        /// Display name of the terminal
        terminal: String,
        /// Display name of the block that owns it
        owner: String,
    },

    /// The target terminal is already the target of a transfer
    #[error("Terminal {terminal} is already being transferred by another terminal")]
    TargetAlreadyTransferred {
        /// Display name of the target terminal
        terminal: String,
    },

    /// The source terminal is already the source of a transfer
    #[error("Terminal {terminal} is already transferring to another terminal")]
    SourceAlreadyTransferring {
        /// Display name of the source terminal
        terminal: String,
    },

    /// The source block is already part of another block
    #[error("{node} is already part of {parent}")]
    AlreadyPartOf {
        /// Display name of the would-be part
        node: String,
        /// Display name of its current parent
        parent: String,
    },

    /// Structurally derived connections cannot be retyped
    #[error("Connection {edge} is locked and cannot be retyped")]
    LockedEdge {
        /// Id of the locked edge
        edge: String,
    },

    /// Another connection between the same nodes already holds the requested relation
    #[error("Connection {edge} already holds a {edge_type} relation between these nodes")]
    RelationTaken {
        /// Id of the edge holding the relation
        edge: String,
        /// The requested edge type
        edge_type: EdgeType,
    },

    /// Only Part and Fulfilled connections can be converted into each other
    #[error("Cannot change a {from} connection into a {to} connection")]
    UnsupportedRetype {
        /// Current edge type
        from: EdgeType,
        /// Requested edge type
        to: EdgeType,
    },

    /// One of the endpoints of a retyped connection is gone
    #[error("Could not find nodes to update connection data. Refresh page & try again.")]
    NodesMissing,
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IOError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let errors = vec![
            (CoreError::NodeNotFound("7".to_string()), "Node not found: 7"),
            (CoreError::EdgeNotFound("e1".to_string()), "Edge not found: e1"),
            (CoreError::ValidationError("invalid".to_string()), "Validation error: invalid"),
            (CoreError::StateStoreError("db_err".to_string()), "State store error: db_err"),
            (CoreError::IOError("io_err".to_string()), "Input/output error: io_err"),
            (CoreError::SerializationError("ser_err".to_string()), "Serialization error: ser_err"),
            (CoreError::ConfigurationError("config_err".to_string()), "Configuration error: config_err"),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_rejection_messages() {
        let owned = Rejection::TerminalAlreadyOwned {
            terminal: "Inlet".to_string(),
            owner: "Pump".to_string(),
        };
        assert_eq!(owned.to_string(), "Terminal Inlet is already a terminal of Pump");

        let part = Rejection::AlreadyPartOf {
            node: "Motor".to_string(),
            parent: "Pump".to_string(),
        };
        assert_eq!(part.to_string(), "Motor is already part of Pump");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error: CoreError = io_error.into();

        match error {
            CoreError::IOError(msg) => {
                assert!(msg.contains("file not found"));
            }
            _ => panic!("Expected IOError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: CoreError = "test error message".into();
        assert_eq!(error, CoreError::Other("test error message".to_string()));
    }
}
