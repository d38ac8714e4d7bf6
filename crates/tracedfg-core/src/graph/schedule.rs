//! Schedule passes: dependency-ordered execution of every node.
//!
//! A pass resets all buffers and per-node dependency counters, then runs a
//! depth-first walk from every root (a node with no connected inputs), in
//! node-id order. After a node runs, each reader on each of its output
//! ports, in port and connection order, has its counter decremented; a
//! reader whose counter reaches zero runs immediately, before the next
//! reader of the same node is considered.
//!
//! The walk uses an explicit stack of cursors instead of recursion, so
//! arbitrarily deep chains cannot overflow the call stack.

use super::buffer::Buffer;
use super::context::ProcessContext;
use super::node::{Node, NodeId};
use super::port::PortRef;
use super::processing::Graph;
use crate::error::DfgError;

/// Outcome of a successful schedule pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    executed: Vec<NodeId>,
}

impl PassReport {
    /// Nodes in the order they ran.
    pub fn executed(&self) -> &[NodeId] {
        &self.executed
    }

    /// Number of nodes that ran.
    pub fn len(&self) -> usize {
        self.executed.len()
    }

    /// Returns `true` if no node ran.
    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }
}

/// Cursor over the readers of one executed node.
struct Frame {
    node: NodeId,
    port: usize,
    connection: usize,
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            port: 0,
            connection: 0,
        }
    }

    /// Advances to the next reader of this frame's node.
    fn next_reader(&mut self, node: &Node) -> Option<PortRef> {
        let specs = node.node_type.ports();
        while let Some(port) = node.ports.get(self.port) {
            if specs[self.port].is_output() {
                if let Some(&reader) = port.connections.get(self.connection) {
                    self.connection += 1;
                    return Some(reader);
                }
            }
            self.port += 1;
            self.connection = 0;
        }
        None
    }
}

impl Graph {
    /// Runs one schedule pass.
    ///
    /// # Errors
    ///
    /// - [`DfgError::NotWellConnected`] before anything runs if a mandatory
    ///   port is unconnected.
    /// - [`DfgError::Process`] if a node fails. The pass stops at the
    ///   failing node and every buffer is emptied before returning.
    pub fn schedule(&mut self) -> Result<PassReport, DfgError> {
        if let Some(node) = self.nodes.values().find(|n| !n.is_well_connected()) {
            let port = node
                .unconnected_mandatory_port()
                .map(|spec| spec.name().to_string())
                .unwrap_or_default();
            return Err(DfgError::NotWellConnected {
                node: node.id,
                node_type: node.node_type.name().to_string(),
                port,
            });
        }

        for node in self.nodes.values_mut() {
            node.reset_schedule_state();
        }
        self.reset_buffers();

        let result = self.run_pass();
        match &result {
            Ok(_report) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("schedule: pass complete, {} nodes executed", _report.len());
            }
            Err(_err) => {
                self.reset_buffers();
                #[cfg(feature = "tracing")]
                tracing::warn!("schedule: pass aborted: {_err}");
            }
        }
        result
    }

    /// Empties every buffer, keeping allocations and reference counts.
    pub fn reset_buffers(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.reset();
        }
    }

    fn run_pass(&mut self) -> Result<PassReport, DfgError> {
        let mut report = PassReport::default();
        let roots: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.deps_remaining == 0)
            .map(|n| n.id)
            .collect();

        let mut stack: Vec<Frame> = Vec::new();
        for root in roots {
            if self.nodes.get(&root).is_none_or(|n| n.visited) {
                continue;
            }
            self.execute(root, &mut report)?;
            stack.push(Frame::new(root));

            while let Some(frame) = stack.last_mut() {
                let reader = self
                    .nodes
                    .get(&frame.node)
                    .and_then(|node| frame.next_reader(node));
                let Some(reader) = reader else {
                    stack.pop();
                    continue;
                };

                let Some(node) = self.nodes.get_mut(&reader.node) else {
                    continue;
                };
                node.deps_remaining = node.deps_remaining.saturating_sub(1);
                if node.deps_remaining == 0 && !node.visited {
                    self.execute(reader.node, &mut report)?;
                    stack.push(Frame::new(reader.node));
                }
            }
        }
        Ok(report)
    }

    /// Runs one node's `process` hook with its buffers attached.
    fn execute(&mut self, id: NodeId, report: &mut PassReport) -> Result<(), DfgError> {
        let Graph { nodes, buffers, .. } = self;
        let node = nodes
            .get_mut(&id)
            .ok_or_else(|| DfgError::not_found("node", id.to_string()))?;
        node.visited = true;

        let Node {
            node_type,
            ports,
            behavior,
            ..
        } = node;
        let specs = node_type.ports();

        // Outputs leave the arena for the duration of the call.
        let mut outputs: Vec<Option<Buffer>> = specs
            .iter()
            .zip(ports.iter())
            .map(|(spec, port)| {
                port.buffer
                    .filter(|_| spec.is_output())
                    .and_then(|b| buffers.get_mut(b.index()))
                    .and_then(Option::take)
            })
            .collect();

        let result = {
            let inputs: Vec<Option<&Buffer>> = specs
                .iter()
                .zip(ports.iter())
                .map(|(spec, port)| {
                    port.buffer
                        .filter(|_| spec.is_input())
                        .and_then(|b| buffers.get(b.index()))
                        .and_then(Option::as_ref)
                })
                .collect();
            let mut ctx = ProcessContext::new(id, specs, ports, inputs, outputs);
            let result = behavior.process(&mut ctx);
            outputs = ctx.into_outputs();
            result
        };

        for (port, output) in ports.iter().zip(outputs) {
            if let (Some(b), Some(buffer)) = (port.buffer, output) {
                buffers[b.index()] = Some(buffer);
            }
        }

        result.map_err(|source| DfgError::Process {
            node: id,
            node_type: node_type.name().to_string(),
            source: Box::new(source),
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("schedule: executed node {id} ({})", node_type.name());
        report.executed.push(id);
        Ok(())
    }
}
