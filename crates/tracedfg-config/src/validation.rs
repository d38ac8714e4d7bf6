//! Pipeline validation against a registry.
//!
//! [`validate_pipeline`] checks everything that can be checked without
//! instantiating nodes and reports every problem at once, where building
//! the graph stops at the first.
//!
//! # Example
//!
//! ```rust
//! use tracedfg_config::{NodeConfig, Pipeline, ValidationError, validate_pipeline};
//! use tracedfg_core::Registry;
//!
//! let registry = Registry::with_builtin_types();
//! let pipeline = Pipeline::new("empty").with_node(NodeConfig::new(1, "no::such::type"));
//! let err = validate_pipeline(&pipeline, &registry).unwrap_err();
//! assert_eq!(err, ValidationError::UnknownNodeType("no::such::type".to_string()));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracedfg_core::{NodeType, Registry};

use crate::pipeline::{Pipeline, parse_endpoint};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown node type.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// Two nodes share an id.
    #[error("duplicate node id {0}")]
    DuplicateId(u64),

    /// Property not declared by the node type.
    #[error("unknown property '{property}' for node type '{node_type}'")]
    UnknownProperty {
        /// Name of the node type.
        node_type: String,
        /// Name of the unrecognized property.
        property: String,
    },

    /// Malformed connection endpoint.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Endpoint refers to a node that is not in the pipeline.
    #[error("endpoint '{0}' refers to an unknown node")]
    UnknownNode(String),

    /// Endpoint names a port the node does not have, or a port of the wrong
    /// direction.
    #[error("endpoint '{endpoint}': {reason}")]
    BadPort {
        /// The endpoint as written.
        endpoint: String,
        /// What is wrong with the port.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Output,
    Input,
}

/// Validates a pipeline: node types and properties exist, ids are unique,
/// and every connection goes from an existing output port to an existing
/// input port.
///
/// Type compatibility and cycles are left to [`Pipeline::build`].
pub fn validate_pipeline(pipeline: &Pipeline, registry: &Registry) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut types: BTreeMap<u64, Option<Arc<NodeType>>> = BTreeMap::new();

    for node in &pipeline.nodes {
        let node_type = match registry.lookup_node_type(&node.node_type) {
            Ok(node_type) => {
                for property in node.properties.keys() {
                    if node_type.find_property(property).is_none() {
                        errors.push(ValidationError::UnknownProperty {
                            node_type: node.node_type.clone(),
                            property: property.clone(),
                        });
                    }
                }
                Some(node_type)
            }
            Err(_) => {
                errors.push(ValidationError::UnknownNodeType(node.node_type.clone()));
                None
            }
        };
        if types.insert(node.id, node_type).is_some() {
            errors.push(ValidationError::DuplicateId(node.id));
        }
    }

    let mut check = |endpoint: &str, direction: Direction| {
        let Ok((id, port)) = parse_endpoint(endpoint) else {
            errors.push(ValidationError::InvalidEndpoint(endpoint.to_string()));
            return;
        };
        let Some(node_type) = types.get(&id) else {
            errors.push(ValidationError::UnknownNode(endpoint.to_string()));
            return;
        };
        // Unknown type already reported.
        let Some(node_type) = node_type else {
            return;
        };
        let bad_port = |reason: String| ValidationError::BadPort {
            endpoint: endpoint.to_string(),
            reason,
        };
        match node_type.find_port(port).and_then(|i| node_type.port(i)) {
            None => errors.push(bad_port(format!(
                "node type '{}' has no port '{port}'",
                node_type.name()
            ))),
            Some(spec) if direction == Direction::Output && !spec.is_output() => {
                errors.push(bad_port(format!("'{port}' is not an output port")));
            }
            Some(spec) if direction == Direction::Input && !spec.is_input() => {
                errors.push(bad_port(format!("'{port}' is not an input port")));
            }
            Some(_) => {}
        }
    };

    for connection in &pipeline.connections {
        check(&connection.from, Direction::Output);
        check(&connection.to, Direction::Input);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
