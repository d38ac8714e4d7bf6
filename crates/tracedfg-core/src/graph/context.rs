//! Views of the graph handed to node callbacks.

use super::buffer::Buffer;
use super::node::NodeId;
use super::port::{Port, PortFlags, PortSpec};
use crate::error::DfgError;
use crate::types::TypeRef;

/// Buffers available to a node while it processes.
///
/// Inputs borrow the producers' buffers; outputs are the node's own buffers,
/// detached from the graph for the duration of the call.
pub struct ProcessContext<'a> {
    node: NodeId,
    specs: &'a [PortSpec],
    ports: &'a [Port],
    inputs: Vec<Option<&'a Buffer>>,
    outputs: Vec<Option<Buffer>>,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        node: NodeId,
        specs: &'a [PortSpec],
        ports: &'a [Port],
        inputs: Vec<Option<&'a Buffer>>,
        outputs: Vec<Option<Buffer>>,
    ) -> Self {
        Self {
            node,
            specs,
            ports,
            inputs,
            outputs,
        }
    }

    /// Id of the node being processed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns `true` if `port` has at least one connection.
    pub fn is_connected(&self, port: usize) -> bool {
        self.ports.get(port).is_some_and(Port::is_connected)
    }

    /// Returns `true` if `port` takes part in this pass.
    ///
    /// Inputs are activated when connected. Outputs are activated when
    /// connected or when they are not flagged [`PortFlags::ON_DEMAND`].
    pub fn activated(&self, port: usize) -> bool {
        let Some(spec) = self.specs.get(port) else {
            return false;
        };
        if spec.is_output() && !spec.flags().contains(PortFlags::ON_DEMAND) {
            return true;
        }
        self.is_connected(port)
    }

    /// Returns `true` if `port` is a connected input whose buffer holds
    /// samples.
    pub fn has_data(&self, port: usize) -> bool {
        self.input(port).is_some_and(|b| !b.is_empty())
    }

    /// Buffer feeding input `port`, or `None` if it is unconnected.
    pub fn input(&self, port: usize) -> Option<&'a Buffer> {
        self.inputs.get(port).copied().flatten()
    }

    /// Buffer feeding input `port`.
    ///
    /// # Errors
    ///
    /// Fails if the port is not a connected input.
    pub fn require_input(&self, port: usize) -> Result<&'a Buffer, DfgError> {
        self.input(port)
            .ok_or_else(|| DfgError::failure(format!("input port \"{}\" is not connected", self.port_name(port))))
    }

    /// Buffer of output `port`.
    ///
    /// # Errors
    ///
    /// Fails if `port` is not an output of this node.
    pub fn output(&mut self, port: usize) -> Result<&mut Buffer, DfgError> {
        let name = self.port_name(port).to_string();
        self.outputs
            .get_mut(port)
            .and_then(Option::as_mut)
            .ok_or_else(|| DfgError::failure(format!("port \"{name}\" is not an output")))
    }

    pub(crate) fn into_outputs(self) -> Vec<Option<Buffer>> {
        self.outputs
    }

    fn port_name(&self, port: usize) -> &str {
        self.specs.get(port).map_or("?", PortSpec::name)
    }
}

/// Access to a node's ports and buffers from inside a connection hook.
pub struct HookContext<'a> {
    node: NodeId,
    specs: &'a [PortSpec],
    ports: &'a [Port],
    buffers: &'a mut [Option<Buffer>],
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        node: NodeId,
        specs: &'a [PortSpec],
        ports: &'a [Port],
        buffers: &'a mut [Option<Buffer>],
    ) -> Self {
        Self {
            node,
            specs,
            ports,
            buffers,
        }
    }

    /// Id of the node whose hook is running.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Number of connections on `port`.
    pub fn num_connections(&self, port: usize) -> usize {
        self.ports.get(port).map_or(0, Port::num_connections)
    }

    /// Number of connections over the node's input ports.
    pub fn num_input_connections(&self) -> usize {
        self.specs
            .iter()
            .zip(self.ports)
            .filter(|(spec, _)| spec.is_input())
            .map(|(_, port)| port.num_connections())
            .sum()
    }

    /// Type `port` was declared with in the node type.
    pub fn declared_type(&self, port: usize) -> Option<&TypeRef> {
        self.specs.get(port).map(PortSpec::data_type)
    }

    /// Returns `true` if `port` is an output port.
    pub fn is_output(&self, port: usize) -> bool {
        self.specs.get(port).is_some_and(PortSpec::is_output)
    }

    /// Current type of the buffer attached to `port`: the node's own buffer
    /// for outputs, the producer's buffer for connected inputs.
    pub fn buffer_type(&self, port: usize) -> Option<&TypeRef> {
        let id = self.ports.get(port)?.buffer()?;
        self.buffers
            .get(id.index())?
            .as_ref()
            .map(Buffer::data_type)
    }

    /// Changes the sample type of output `port`'s buffer.
    ///
    /// # Errors
    ///
    /// Fails if `port` is not an output, or with [`DfgError::BufferShared`]
    /// when more than one reader is attached.
    pub fn retype_output(&mut self, port: usize, data_type: TypeRef) -> Result<(), DfgError> {
        let is_output = self.specs.get(port).is_some_and(PortSpec::is_output);
        let buffer = self
            .ports
            .get(port)
            .and_then(Port::buffer)
            .filter(|_| is_output)
            .and_then(|id| self.buffers.get_mut(id.index()))
            .and_then(Option::as_mut)
            .ok_or_else(|| DfgError::failure(format!("port {port} is not an output")))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "retype_output: node {} port {} {} -> {}",
            self.node,
            port,
            buffer.data_type(),
            data_type
        );
        buffer.change_type(data_type)
    }
}
