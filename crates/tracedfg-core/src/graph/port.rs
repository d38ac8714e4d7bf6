//! Ports: typed connection points on a node.
//!
//! A node type declares its ports as a list of [`PortSpec`]s. Every node
//! instance owns one [`Port`] per declaration, in declaration order, holding
//! its buffer handle and its connections. Ports are addressed from outside a
//! node with a [`PortRef`] (node id + port index).

use std::fmt;

use super::buffer::BufferId;
use super::node::NodeId;
use crate::types::TypeRef;

/// Port flag set.
///
/// Use [`union`](Self::union) to combine.
///
/// ```rust
/// use tracedfg_core::graph::PortFlags;
///
/// let flags = PortFlags::IN.union(PortFlags::MANDATORY);
/// assert!(flags.contains(PortFlags::MANDATORY));
/// assert!(!flags.contains(PortFlags::OUT));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortFlags(u8);

impl PortFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Input port: reads the buffer of the connected output port.
    pub const IN: Self = Self(1 << 0);
    /// Output port: owns a buffer and may fan out to many inputs.
    pub const OUT: Self = Self(1 << 1);
    /// Must be connected for the node to be scheduled.
    pub const MANDATORY: Self = Self(1 << 2);
    /// Output produced only when at least one reader is connected.
    ///
    /// Output ports without this flag are always activated.
    pub const ON_DEMAND: Self = Self(1 << 3);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Declaration of a port on a node type.
#[derive(Debug, Clone)]
pub struct PortSpec {
    name: String,
    data_type: TypeRef,
    flags: PortFlags,
}

impl PortSpec {
    /// Creates a declaration. Exactly one of `IN`/`OUT` should be set.
    pub fn new(name: impl Into<String>, data_type: TypeRef, flags: PortFlags) -> Self {
        Self {
            name: name.into(),
            data_type,
            flags,
        }
    }

    /// Port name, unique within its node type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type constraint (possibly the wildcard).
    pub fn data_type(&self) -> &TypeRef {
        &self.data_type
    }

    /// Declared flags.
    pub fn flags(&self) -> PortFlags {
        self.flags
    }

    /// Returns `true` for output ports.
    pub fn is_output(&self) -> bool {
        self.flags.contains(PortFlags::OUT)
    }

    /// Returns `true` for input ports.
    pub fn is_input(&self) -> bool {
        self.flags.contains(PortFlags::IN)
    }

    /// Returns `true` if the port must be connected for scheduling.
    pub fn is_mandatory(&self) -> bool {
        self.flags.contains(PortFlags::MANDATORY)
    }
}

/// Address of a port: node id plus index into the node type's port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    /// Owning node.
    pub node: NodeId,
    /// Index of the port in declaration order.
    pub port: usize,
}

impl PortRef {
    /// Creates a port address.
    pub fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

/// Human-readable port address used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortLabel {
    /// Owning node.
    pub node: NodeId,
    /// Port name.
    pub port: String,
}

impl fmt::Display for PortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} port \"{}\"", self.node, self.port)
    }
}

/// Per-instance state of a port.
#[derive(Debug, Clone, Default)]
pub struct Port {
    pub(crate) buffer: Option<BufferId>,
    pub(crate) connections: Vec<PortRef>,
}

impl Port {
    pub(crate) fn new(buffer: Option<BufferId>) -> Self {
        Self {
            buffer,
            connections: Vec::new(),
        }
    }

    /// Buffer this port writes (output) or reads (connected input).
    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    /// Connected peer ports, in connection order.
    pub fn connections(&self) -> &[PortRef] {
        &self.connections
    }

    /// Returns `true` if at least one peer is connected.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Number of connected peers.
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }
}
