//! Node instances.

use std::fmt;
use std::sync::Arc;

use super::port::{Port, PortSpec};
use crate::error::DfgError;
use crate::node_type::{NodeBehavior, NodeType};
use crate::notation::{Group, Value};

/// Group name of a serialized node.
pub const NODE_GROUP: &str = "am_dfg_node";

/// Identifier of a node, unique within its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node instance: one [`Port`] per declared port plus its behaviour.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) node_type: Arc<NodeType>,
    pub(crate) ports: Vec<Port>,
    pub(crate) behavior: Box<dyn NodeBehavior>,
    pub(crate) deps_remaining: usize,
    pub(crate) visited: bool,
}

impl Node {
    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The type this node was created from.
    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    /// Port instances, in declaration order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Port instance `index`.
    pub fn port(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    /// Declaration of port `index`.
    pub fn port_spec(&self, index: usize) -> Option<&PortSpec> {
        self.node_type.port(index)
    }

    /// Index of the port called `name`.
    pub fn find_port(&self, name: &str) -> Option<usize> {
        self.node_type.find_port(name)
    }

    /// Behaviour object.
    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    /// First mandatory port without a connection, if any.
    pub fn unconnected_mandatory_port(&self) -> Option<&PortSpec> {
        self.node_type
            .ports()
            .iter()
            .zip(&self.ports)
            .find(|(spec, port)| spec.is_mandatory() && !port.is_connected())
            .map(|(spec, _)| spec)
    }

    /// Returns `true` if every mandatory port is connected.
    pub fn is_well_connected(&self) -> bool {
        self.unconnected_mandatory_port().is_none()
    }

    /// Number of input ports with a connection.
    pub fn connected_inputs(&self) -> usize {
        self.node_type
            .ports()
            .iter()
            .zip(&self.ports)
            .filter(|(spec, port)| spec.is_input() && port.is_connected())
            .count()
    }

    /// Dependencies left before the node may run in the current pass.
    pub fn deps_remaining(&self) -> usize {
        self.deps_remaining
    }

    /// Returns `true` if the node already ran in the current pass.
    pub fn visited(&self) -> bool {
        self.visited
    }

    /// Current value of a declared property.
    ///
    /// # Errors
    ///
    /// [`DfgError::InvalidProperty`] if the type does not declare the
    /// property or the node has no value for it.
    pub fn get_property(&self, name: &str) -> Result<Value, DfgError> {
        self.check_property(name)?;
        self.behavior
            .get_property(name)
            .ok_or_else(|| DfgError::invalid_property(name, "property has no value"))
    }

    /// Updates a declared property.
    pub fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        self.check_property(name)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("set_property: node {} {} = {:?}", self.id, name, value);
        self.behavior.set_property(name, value)
    }

    /// Serializes the node as an `am_dfg_node` group.
    pub fn to_notation(&self) -> Result<Group, DfgError> {
        let mut group = Group::new(NODE_GROUP)
            .with("type", self.node_type.name())
            .with("id", Value::from(self.id.0));
        self.behavior
            .to_notation(self.node_type.properties(), &mut group)?;
        Ok(group)
    }

    pub(crate) fn reset_schedule_state(&mut self) {
        self.deps_remaining = self.connected_inputs();
        self.visited = false;
    }

    fn check_property(&self, name: &str) -> Result<(), DfgError> {
        if self.node_type.find_property(name).is_none() {
            return Err(DfgError::invalid_property(
                name,
                format!("not a property of {}", self.node_type.name()),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.node_type.name())
            .field("ports", &self.ports)
            .field("deps_remaining", &self.deps_remaining)
            .field("visited", &self.visited)
            .finish_non_exhaustive()
    }
}
