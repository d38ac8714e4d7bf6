//! Graph: node membership, connections and buffer lifetime.
//!
//! [`Graph`] owns every node and every buffer of a dataflow network. Nodes
//! live in an id-ordered map; buffers live in an arena addressed by
//! [`BufferId`] and are freed when their reference count reaches zero.
//! Connections are validated here (direction, type compatibility, single
//! writer per input, acyclicity, node-type hooks) so the scheduler can
//! assume a well-formed topology.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::buffer::{Buffer, BufferId};
use super::context::HookContext;
use super::node::{Node, NodeId};
use super::port::{Port, PortLabel, PortRef};
use crate::error::DfgError;
use crate::node_type::NodeType;
use crate::notation::Value;
use crate::registry::Registry;
use crate::types::{TypeRef, types_compatible};

/// A dataflow network of nodes and the buffers connecting them.
///
/// # Example
///
/// ```rust,ignore
/// let mut graph = Graph::new();
/// let c = graph.add_node(&registry, "am::core::double_constant")?;
/// let add = graph.add_node(&registry, "am::core::arithmetic::double::add")?;
/// graph.connect_by_name(c, "out", add, "in")?;
/// graph.schedule()?;
/// ```
pub struct Graph {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) buffers: Vec<Option<Buffer>>,
    free_slots: Vec<BufferId>,
    owns_nodes: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph that owns its nodes.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            buffers: Vec::new(),
            free_slots: Vec::new(),
            owns_nodes: true,
        }
    }

    /// Whether `destroy` hooks run when nodes are dropped with the graph.
    pub fn owns_nodes(&self) -> bool {
        self.owns_nodes
    }

    /// Sets the node ownership flag.
    pub fn set_owns_nodes(&mut self, owns_nodes: bool) {
        self.owns_nodes = owns_nodes;
    }

    // --- Node mutations ---

    /// Instantiates `type_name` under the next free id (max id + 1).
    pub fn add_node(&mut self, registry: &Registry, type_name: &str) -> Result<NodeId, DfgError> {
        let node_type = registry.lookup_node_type(type_name)?;
        self.add_node_of_type(&node_type, self.next_id())
    }

    /// Instantiates `type_name` under `id`.
    pub fn add_node_with_id(
        &mut self,
        registry: &Registry,
        type_name: &str,
        id: NodeId,
    ) -> Result<NodeId, DfgError> {
        let node_type = registry.lookup_node_type(type_name)?;
        self.add_node_of_type(&node_type, id)
    }

    /// Instantiates `node_type` under `id`.
    ///
    /// Runs the type's `init` hook before any buffer is allocated; if it
    /// fails the graph is left unchanged and [`DfgError::Init`] is returned.
    pub fn add_node_of_type(
        &mut self,
        node_type: &Arc<NodeType>,
        id: NodeId,
    ) -> Result<NodeId, DfgError> {
        if self.nodes.contains_key(&id) {
            return Err(DfgError::DuplicateNodeId(id));
        }

        let mut behavior = node_type.new_behavior();
        behavior.init().map_err(|source| DfgError::Init {
            node: id,
            node_type: node_type.name().to_string(),
            source: Box::new(source),
        })?;

        let mut ports = Vec::with_capacity(node_type.ports().len());
        for spec in node_type.ports() {
            let buffer = if spec.is_output() {
                match self.alloc_buffer(Buffer::new(Arc::clone(spec.data_type()))) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        for buffer in ports.iter().filter_map(Port::buffer) {
                            self.release_buffer(buffer);
                        }
                        return Err(err);
                    }
                }
            } else {
                None
            };
            ports.push(Port::new(buffer));
        }

        self.nodes.insert(
            id,
            Node {
                id,
                node_type: Arc::clone(node_type),
                ports,
                behavior,
                deps_remaining: 0,
                visited: false,
            },
        );
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: node {id} ({})", node_type.name());
        Ok(id)
    }

    /// Removes a node after disconnecting all of its ports.
    ///
    /// Disconnect hooks run for every removed link. The node's `destroy`
    /// hook runs if the graph owns its nodes.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), DfgError> {
        let node = self.node_ref(id)?;

        // Collect links first to avoid a borrow conflict.
        let mut links = Vec::new();
        for (index, (spec, port)) in node.node_type.ports().iter().zip(&node.ports).enumerate() {
            let here = PortRef::new(id, index);
            for &peer in &port.connections {
                if spec.is_input() {
                    links.push((peer, here));
                } else {
                    links.push((here, peer));
                }
            }
        }

        for (src, dst) in links {
            if let Err(_err) = self.disconnect(src, dst) {
                #[cfg(feature = "tracing")]
                tracing::warn!("graph_remove: disconnect hook failed on node {id}: {_err}");
            }
        }

        let Some(mut node) = self.nodes.remove(&id) else {
            return Err(DfgError::not_found("node", id.to_string()));
        };
        for port in &node.ports {
            if let Some(buffer) = port.buffer {
                self.release_buffer(buffer);
            }
        }
        if self.owns_nodes {
            node.behavior.destroy();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    /// Sets a property on a node.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &Value) -> Result<(), DfgError> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| DfgError::not_found("node", id.to_string()))?
            .set_property(name, value)
    }

    /// Reads a property of a node.
    pub fn get_property(&self, id: NodeId, name: &str) -> Result<Value, DfgError> {
        self.node_ref(id)?.get_property(name)
    }

    // --- Connections ---

    /// Connects output port `src` to input port `dst`.
    ///
    /// Checks run in this order, and nothing is modified unless all pass:
    /// port directions, type compatibility, the single-writer rule for
    /// `dst`, acyclicity, then the `pre_connect` hooks of the destination
    /// and source node types. After linking, the `connect` hooks of source
    /// and destination run; if either fails the link is undone.
    ///
    /// # Errors
    ///
    /// [`DfgError::InvalidConnection`], [`DfgError::TypeMismatch`],
    /// [`DfgError::AlreadyConnected`], [`DfgError::CycleDetected`],
    /// [`DfgError::Rejected`], or whatever a `connect` hook returns.
    pub fn connect(&mut self, src: PortRef, dst: PortRef) -> Result<(), DfgError> {
        let src_label = self.label(src)?;
        let dst_label = self.label(dst)?;
        let src_node = self.node_ref(src.node)?;
        let dst_node = self.node_ref(dst.node)?;
        let src_spec = &src_node.node_type.ports()[src.port];
        let dst_spec = &dst_node.node_type.ports()[dst.port];

        if !src_spec.is_output() {
            return Err(DfgError::InvalidConnection {
                src: src_label,
                dst: dst_label,
                reason: "source is not an output port",
            });
        }
        if !dst_spec.is_input() {
            return Err(DfgError::InvalidConnection {
                src: src_label,
                dst: dst_label,
                reason: "destination is not an input port",
            });
        }

        let buffer_id = src_node.ports[src.port]
            .buffer
            .ok_or_else(|| DfgError::not_found("buffer", src_label.to_string()))?;
        let src_type = self.buffer_type(buffer_id)?;
        let dst_type = Arc::clone(dst_spec.data_type());

        if !types_compatible(&src_type, &dst_type) {
            return Err(DfgError::TypeMismatch {
                src: src_label,
                src_type: src_type.name().to_string(),
                dst: dst_label,
                dst_type: dst_type.name().to_string(),
            });
        }

        if let Some(&existing) = dst_node.ports[dst.port].connections.first() {
            let existing = self.label(existing)?;
            return Err(DfgError::AlreadyConnected {
                dst: dst_label,
                existing,
            });
        }

        if src.node == dst.node || self.can_reach(dst.node, src.node) {
            return Err(DfgError::CycleDetected {
                src: src_label,
                dst: dst_label,
            });
        }

        dst_node
            .behavior
            .pre_connect(dst.port, &src_type)
            .and_then(|()| src_node.behavior.pre_connect(src.port, &dst_type))
            .map_err(|reason| DfgError::Rejected {
                src: src_label.clone(),
                dst: dst_label.clone(),
                reason,
            })?;

        self.link(src, dst, buffer_id);

        if let Err(err) = self.run_connect_hook(src, &dst_type) {
            self.unlink(src, dst);
            return Err(err);
        }
        let src_type = self.buffer_type(buffer_id)?;
        if let Err(err) = self.run_connect_hook(dst, &src_type) {
            self.unlink(src, dst);
            if let Err(_undo) = self.run_disconnect_hook(src) {
                #[cfg(feature = "tracing")]
                tracing::warn!("graph_connect: undo of {src_label} failed: {_undo}");
            }
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {src_label} -> {dst_label}");
        Ok(())
    }

    /// [`connect`](Self::connect) with ports addressed by name.
    pub fn connect_by_name(
        &mut self,
        src_node: NodeId,
        src_port: &str,
        dst_node: NodeId,
        dst_port: &str,
    ) -> Result<(), DfgError> {
        let src = self.find_port(src_node, src_port)?;
        let dst = self.find_port(dst_node, dst_port)?;
        self.connect(src, dst)
    }

    /// Removes the link from `src` to `dst`, then runs the disconnect hooks
    /// of the source and destination node types.
    ///
    /// The link is gone even if a hook fails; the first hook error is
    /// returned.
    pub fn disconnect(&mut self, src: PortRef, dst: PortRef) -> Result<(), DfgError> {
        let linked = self
            .node_ref(src.node)?
            .ports
            .get(src.port)
            .is_some_and(|p| p.connections.contains(&dst));
        if !linked {
            return Err(DfgError::NotConnected {
                src: self.label(src)?,
                dst: self.label(dst)?,
            });
        }

        self.unlink(src, dst);
        let src_result = self.run_disconnect_hook(src);
        let dst_result = self.run_disconnect_hook(dst);

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {} -/- {}", src.node, dst.node);
        src_result.and(dst_result)
    }

    /// Moves the connection `src -> old_dst` to `src -> new_dst`.
    ///
    /// If the new connection fails, the old one is restored and the error
    /// of the failed connection is returned.
    pub fn reconnect(
        &mut self,
        src: PortRef,
        old_dst: PortRef,
        new_dst: PortRef,
    ) -> Result<(), DfgError> {
        self.disconnect(src, old_dst)?;
        match self.connect(src, new_dst) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Err(_restore) = self.connect(src, old_dst) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("graph_reconnect: failed to restore old link: {_restore}");
                }
                Err(err)
            }
        }
    }

    // --- Queries ---

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if a node with this id exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The node with this id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Address of the port called `name` on node `id`.
    pub fn find_port(&self, id: NodeId, name: &str) -> Result<PortRef, DfgError> {
        let node = self.node_ref(id)?;
        node.find_port(name)
            .map(|port| PortRef::new(id, port))
            .ok_or_else(|| DfgError::not_found("port", format!("{}:\"{name}\"", id)))
    }

    /// Buffer by arena handle.
    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id.index()).and_then(Option::as_ref)
    }

    /// Buffer written by output `port` of node `id`, or read by a connected
    /// input port.
    pub fn buffer_of(&self, id: NodeId, port: &str) -> Result<&Buffer, DfgError> {
        let port_ref = self.find_port(id, port)?;
        self.node_ref(id)?.ports[port_ref.port]
            .buffer
            .and_then(|b| self.buffer(b))
            .ok_or_else(|| DfgError::not_found("buffer", format!("{id}:\"{port}\"")))
    }

    /// Number of live buffers.
    pub fn num_buffers(&self) -> usize {
        self.buffers.iter().flatten().count()
    }

    /// Id one above the current maximum, or 1 for an empty graph.
    pub fn next_id(&self) -> NodeId {
        self.nodes
            .keys()
            .next_back()
            .map_or(NodeId(1), |last| NodeId(last.0.saturating_add(1)))
    }

    // --- Internals ---

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node, DfgError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| DfgError::not_found("node", id.to_string()))
    }

    pub(crate) fn label(&self, port: PortRef) -> Result<PortLabel, DfgError> {
        let node = self.node_ref(port.node)?;
        let spec = node
            .port_spec(port.port)
            .ok_or_else(|| DfgError::not_found("port", format!("{}:{}", port.node, port.port)))?;
        Ok(PortLabel {
            node: port.node,
            port: spec.name().to_string(),
        })
    }

    fn buffer_type(&self, id: BufferId) -> Result<TypeRef, DfgError> {
        self.buffer(id)
            .map(|b| Arc::clone(b.data_type()))
            .ok_or_else(|| DfgError::not_found("buffer", id.to_string()))
    }

    fn alloc_buffer(&mut self, buffer: Buffer) -> Result<BufferId, DfgError> {
        if let Some(id) = self.free_slots.pop() {
            self.buffers[id.index()] = Some(buffer);
            return Ok(id);
        }
        let slot = u32::try_from(self.buffers.len()).map_err(|_| DfgError::Allocation {
            type_name: buffer.data_type().name().to_string(),
            requested: 1,
        })?;
        self.buffers.push(Some(buffer));
        Ok(BufferId(slot))
    }

    /// Drops one reference; frees the slot on the last one.
    fn release_buffer(&mut self, id: BufferId) {
        let Some(slot) = self.buffers.get_mut(id.index()) else {
            return;
        };
        if slot.as_mut().is_some_and(Buffer::dec_ref) {
            *slot = None;
            self.free_slots.push(id);
        }
    }

    fn link(&mut self, src: PortRef, dst: PortRef, buffer: BufferId) {
        if let Some(port) = self.port_mut(src) {
            port.connections.push(dst);
        }
        if let Some(port) = self.port_mut(dst) {
            port.connections.push(src);
            port.buffer = Some(buffer);
        }
        if let Some(Some(b)) = self.buffers.get_mut(buffer.index()) {
            b.inc_ref();
        }
    }

    fn unlink(&mut self, src: PortRef, dst: PortRef) {
        if let Some(port) = self.port_mut(src) {
            port.connections.retain(|&p| p != dst);
        }
        let released = self.port_mut(dst).and_then(|port| {
            port.connections.retain(|&p| p != src);
            port.buffer.take()
        });
        if let Some(buffer) = released {
            self.release_buffer(buffer);
        }
    }

    fn port_mut(&mut self, port: PortRef) -> Option<&mut Port> {
        self.nodes.get_mut(&port.node)?.ports.get_mut(port.port)
    }

    fn run_connect_hook(&mut self, port: PortRef, peer_type: &TypeRef) -> Result<(), DfgError> {
        let Graph { nodes, buffers, .. } = self;
        let node = nodes
            .get_mut(&port.node)
            .ok_or_else(|| DfgError::not_found("node", port.node.to_string()))?;
        let Node {
            id,
            node_type,
            ports,
            behavior,
            ..
        } = node;
        let mut ctx = HookContext::new(*id, node_type.ports(), ports, buffers);
        behavior.connect(&mut ctx, port.port, peer_type)
    }

    fn run_disconnect_hook(&mut self, port: PortRef) -> Result<(), DfgError> {
        let Graph { nodes, buffers, .. } = self;
        let node = nodes
            .get_mut(&port.node)
            .ok_or_else(|| DfgError::not_found("node", port.node.to_string()))?;
        let Node {
            id,
            node_type,
            ports,
            behavior,
            ..
        } = node;
        let mut ctx = HookContext::new(*id, node_type.ports(), ports, buffers);
        behavior.disconnect(&mut ctx, port.port)
    }

    /// Iterative DFS along output connections.
    ///
    /// Returns `true` if `to` is reachable from `from`.
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }

            if let Some(node) = self.nodes.get(&current) {
                for (spec, port) in node.node_type.ports().iter().zip(&node.ports) {
                    if spec.is_output() {
                        stack.extend(port.connections.iter().map(|p| p.node));
                    }
                }
            }
        }
        false
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        if self.owns_nodes {
            for node in self.nodes.values_mut() {
                node.behavior.destroy();
            }
        }
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.values().collect::<Vec<_>>())
            .field("buffers", &self.num_buffers())
            .field("owns_nodes", &self.owns_nodes)
            .finish()
    }
}
