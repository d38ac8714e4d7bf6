//! Error types for graph construction, buffer access and scheduling.

use thiserror::Error;

use crate::graph::{NodeId, PortLabel};
use crate::notation::ParseError;

/// Errors that can occur in any engine operation.
///
/// Topology errors carry the node ids and port names involved so that a
/// caller can point the user at the exact connection that failed.
#[derive(Debug, Error)]
pub enum DfgError {
    /// Sizing a buffer overflowed or the allocator refused the request.
    #[error("cannot allocate {requested} samples of type '{type_name}'")]
    Allocation {
        /// Sample type of the buffer being sized.
        type_name: String,
        /// Requested number of samples.
        requested: usize,
    },

    /// Buffer access beyond the number of stored samples.
    #[error("samples {offset}..{offset}+{count} out of range for buffer of {len} samples")]
    OutOfRange {
        /// First requested sample.
        offset: usize,
        /// Number of requested samples.
        count: usize,
        /// Number of samples in the buffer.
        len: usize,
    },

    /// Typed access to a buffer that stores a different sample type.
    #[error("buffer holds '{buffer_type}' samples, cannot access them as {requested}")]
    BufferType {
        /// Registered name of the buffer's sample type.
        buffer_type: String,
        /// Rust type the caller asked for.
        requested: &'static str,
    },

    /// A sample's copy function failed while writing to a buffer.
    #[error("failed to copy sample of type '{type_name}': {reason}")]
    SampleCopy {
        /// Sample type being copied.
        type_name: String,
        /// Reason reported by the copy function.
        reason: String,
    },

    /// A buffer type change was refused because other readers still depend on it.
    #[error("cannot change type of '{type_name}' buffer with {readers} attached readers")]
    BufferShared {
        /// Current sample type of the buffer.
        type_name: String,
        /// Number of readers attached to the buffer.
        readers: usize,
    },

    /// Connection between ports with incompatible sample types.
    #[error("type mismatch: {src} ({src_type}) cannot feed {dst} ({dst_type})")]
    TypeMismatch {
        /// Source (output) port.
        src: PortLabel,
        /// Sample type currently carried by the source port.
        src_type: String,
        /// Destination (input) port.
        dst: PortLabel,
        /// Sample type declared by the destination port.
        dst_type: String,
    },

    /// An input port already has a connection.
    #[error("{dst} is already connected to {existing}")]
    AlreadyConnected {
        /// Input port that was about to receive a second connection.
        dst: PortLabel,
        /// Output port currently feeding it.
        existing: PortLabel,
    },

    /// The connection would introduce a cycle.
    #[error("connecting {src} to {dst} would create a cycle")]
    CycleDetected {
        /// Source (output) port.
        src: PortLabel,
        /// Destination (input) port.
        dst: PortLabel,
    },

    /// The ports cannot be linked in this direction.
    #[error("invalid connection from {src} to {dst}: {reason}")]
    InvalidConnection {
        /// Proposed source port.
        src: PortLabel,
        /// Proposed destination port.
        dst: PortLabel,
        /// What is wrong with the pair.
        reason: &'static str,
    },

    /// The ports to disconnect are not linked.
    #[error("{src} is not connected to {dst}")]
    NotConnected {
        /// Source (output) port.
        src: PortLabel,
        /// Destination (input) port.
        dst: PortLabel,
    },

    /// A node type's `pre_connect` hook refused the connection.
    #[error("connection from {src} to {dst} rejected: {reason}")]
    Rejected {
        /// Source (output) port.
        src: PortLabel,
        /// Destination (input) port.
        dst: PortLabel,
        /// Message produced by the hook.
        reason: String,
    },

    /// A mandatory port is unconnected at schedule time.
    #[error("node {node} ({node_type}) is not well connected: mandatory port \"{port}\" is unconnected")]
    NotWellConnected {
        /// Offending node.
        node: NodeId,
        /// Name of the node's type.
        node_type: String,
        /// First unconnected mandatory port.
        port: String,
    },

    /// A node's `init` callback failed.
    #[error("node {node} ({node_type}) failed to initialize: {source}")]
    Init {
        /// Node being instantiated.
        node: NodeId,
        /// Name of the node's type.
        node_type: String,
        /// Failure reported by the callback.
        #[source]
        source: Box<DfgError>,
    },

    /// A node's `process` callback failed.
    #[error("node {node} ({node_type}) failed to process: {source}")]
    Process {
        /// Node being executed.
        node: NodeId,
        /// Name of the node's type.
        node_type: String,
        /// Failure reported by the callback.
        #[source]
        source: Box<DfgError>,
    },

    /// Free-form failure raised from inside a node callback.
    #[error("{0}")]
    NodeFailure(String),

    /// Unknown property name or malformed property value.
    #[error("invalid property '{property}': {reason}")]
    InvalidProperty {
        /// Property name.
        property: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Lookup miss for a type, node type, node or port.
    #[error("unknown {kind} '{name}'")]
    NotFound {
        /// What was looked up (`"sample type"`, `"node type"`, ...).
        kind: &'static str,
        /// The name or id that was not found.
        name: String,
    },

    /// A registration used a name that is already taken.
    #[error("{kind} '{name}' is already registered")]
    DuplicateType {
        /// `"sample type"` or `"node type"`.
        kind: &'static str,
        /// The duplicate name.
        name: String,
    },

    /// A node type definition is malformed.
    #[error("invalid node type '{node_type}': {reason}")]
    InvalidNodeType {
        /// Name of the node type being registered.
        node_type: String,
        /// What is wrong with the definition.
        reason: String,
    },

    /// A node with this id is already part of the graph.
    #[error("graph already contains a node with id {0}")]
    DuplicateNodeId(NodeId),

    /// Schema mismatch in a topology description.
    #[error("invalid topology description: {0}")]
    Serialization(String),

    /// Malformed object-notation text.
    #[error(transparent)]
    Syntax(#[from] ParseError),
}

impl DfgError {
    /// Create a lookup-miss error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        DfgError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a free-form callback failure.
    pub fn failure(message: impl Into<String>) -> Self {
        DfgError::NodeFailure(message.into())
    }

    /// Create an invalid property error.
    pub fn invalid_property(property: impl Into<String>, reason: impl Into<String>) -> Self {
        DfgError::InvalidProperty {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Create a topology description error.
    pub fn serialization(message: impl Into<String>) -> Self {
        DfgError::Serialization(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn label(node: u64, port: &str) -> PortLabel {
        PortLabel {
            node: NodeId(node),
            port: port.to_string(),
        }
    }

    // --- Display formatting ---

    #[test]
    fn type_mismatch_display_names_both_ports() {
        let err = DfgError::TypeMismatch {
            src: label(1, "out"),
            src_type: "am::core::double".to_string(),
            dst: label(2, "in"),
            dst_type: "am::core::uint64".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "type mismatch: node 1 port \"out\" (am::core::double) cannot feed \
             node 2 port \"in\" (am::core::uint64)"
        );
    }

    #[test]
    fn already_connected_display() {
        let err = DfgError::AlreadyConnected {
            dst: label(3, "in"),
            existing: label(1, "out"),
        };
        let msg = err.to_string();
        assert!(msg.contains("node 3 port \"in\""), "got: {msg}");
        assert!(msg.contains("node 1 port \"out\""), "got: {msg}");
    }

    #[test]
    fn not_found_display() {
        let err = DfgError::not_found("node type", "am::core::nope");
        assert_eq!(err.to_string(), "unknown node type 'am::core::nope'");
    }

    #[test]
    fn not_well_connected_display() {
        let err = DfgError::NotWellConnected {
            node: NodeId(4),
            node_type: "am::core::filter::conditional_forward::pairwise".to_string(),
            port: "control".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("node 4"), "got: {msg}");
        assert!(msg.contains("\"control\""), "got: {msg}");
    }

    #[test]
    fn invalid_property_display() {
        let err = DfgError::invalid_property("N", "expected an integer");
        assert_eq!(err.to_string(), "invalid property 'N': expected an integer");
    }

    // --- Error::source() chain ---

    #[test]
    fn process_error_exposes_callback_failure() {
        let err = DfgError::Process {
            node: NodeId(2),
            node_type: "am::core::arithmetic::uint8::add".to_string(),
            source: Box::new(DfgError::failure("overflow")),
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("overflow"));
        assert!(err.to_string().ends_with("failed to process: overflow"));
    }

    #[test]
    fn failure_has_no_source() {
        assert!(DfgError::failure("x").source().is_none());
    }
}
