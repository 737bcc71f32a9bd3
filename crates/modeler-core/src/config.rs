//! Configuration for the modeler engine
//!
//! Values come from defaults, then an optional YAML file, then environment
//! variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::edge::EdgeType;
use crate::domain::node::NodeId;
use crate::CoreError;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Edge type used when a connection does not name one
    #[serde(default = "default_edge_type")]
    pub default_edge_type: EdgeType,

    /// Value written to `parent` when a node stops being a part
    #[serde(default = "default_detached_parent")]
    pub detached_parent: String,

    /// Log filter directives, used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Capacity of the notification channel
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

fn default_edge_type() -> EdgeType {
    EdgeType::Part
}

fn default_detached_parent() -> String {
    "void".to_string()
}

fn default_log_filter() -> String {
    "info,modeler=debug".to_string()
}

fn default_notification_buffer() -> usize {
    64
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, CoreError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Load configuration from a YAML file, then apply environment variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&raw)?;
        info!(path = %path.as_ref().display(), "Read configuration file");
        config.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(edge_type) = lookup("MODELER_DEFAULT_EDGE_TYPE") {
            match edge_type.parse::<EdgeType>() {
                Ok(edge_type) => self.default_edge_type = edge_type,
                Err(_) => warn!("Invalid MODELER_DEFAULT_EDGE_TYPE value: {}", edge_type),
            }
        }

        if let Some(parent) = lookup("MODELER_DETACHED_PARENT") {
            self.detached_parent = parent;
        }

        if let Some(filter) = lookup("MODELER_LOG_FILTER") {
            self.log_filter = filter;
        }

        if let Some(json_logs) = lookup("MODELER_JSON_LOGS") {
            self.json_logs = json_logs.to_lowercase() == "true" || json_logs == "1";
        }

        if let Some(buffer) = lookup("MODELER_NOTIFICATION_BUFFER") {
            if let Ok(buffer) = buffer.parse::<usize>() {
                self.notification_buffer = buffer;
            } else {
                warn!("Invalid MODELER_NOTIFICATION_BUFFER value: {}", buffer);
            }
        }

        self.validate()?;
        info!("Loaded engine configuration");
        Ok(self)
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.detached_parent.trim().is_empty() {
            return Err(CoreError::ConfigurationError(
                "Detached parent marker must not be empty".to_string(),
            ));
        }

        if self.notification_buffer == 0 {
            return Err(CoreError::ConfigurationError(
                "Notification buffer must hold at least one message".to_string(),
            ));
        }

        Ok(())
    }

    /// The detached parent marker as a node id
    pub fn detached_parent_id(&self) -> NodeId {
        NodeId(self.detached_parent.clone())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_edge_type: default_edge_type(),
            detached_parent: default_detached_parent(),
            log_filter: default_log_filter(),
            json_logs: false,
            notification_buffer: default_notification_buffer(),
        }
    }
}
