//! Saving and restoring graph topologies in object notation.
//!
//! ```text
//! am_dfg_graph {
//! 	nodes: [
//! 		am_dfg_node {
//! 			type: "am::core::double_constant",
//! 			id: 1,
//! 			value: 3.14,
//! 			num_samples: 2
//! 		},
//! 		am_dfg_node {
//! 			type: "am::core::arithmetic::double::add",
//! 			id: 2
//! 		}
//! 	],
//! 	connections: [
//! 		[
//! 			1,
//! 			"out",
//! 			2,
//! 			"in"
//! 		]
//! 	]
//! }
//! ```

use std::collections::BTreeMap;

use super::node::{NODE_GROUP, NodeId};
use super::port::PortRef;
use super::processing::Graph;
use crate::error::DfgError;
use crate::notation::{self, Group, Value};
use crate::registry::Registry;

/// Group name of a serialized graph.
pub const GRAPH_GROUP: &str = "am_dfg_graph";

impl Graph {
    /// Instantiates a node from an `am_dfg_node` description and adds it.
    ///
    /// # Errors
    ///
    /// - [`DfgError::Serialization`] if the value is not an `am_dfg_node`
    ///   group, `type` or `id` is missing or mistyped, or a member does not
    ///   name a property of the node type.
    /// - [`DfgError::NotFound`] if the type is not registered.
    /// - [`DfgError::DuplicateNodeId`] or [`DfgError::Init`] from
    ///   instantiation.
    ///
    /// On error the graph is unchanged.
    pub fn add_node_from_notation(
        &mut self,
        registry: &Registry,
        value: &Value,
    ) -> Result<NodeId, DfgError> {
        let group = expect_group(value, NODE_GROUP)?;
        let type_name = group
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DfgError::serialization("node description needs a string 'type'"))?;
        let id = group
            .get("id")
            .and_then(Value::as_u64)
            .map(NodeId)
            .ok_or_else(|| {
                DfgError::serialization("node description needs a non-negative integer 'id'")
            })?;

        let node_type = registry.lookup_node_type(type_name)?;
        self.add_node_of_type(&node_type, id)?;

        let restored = match self.nodes.get_mut(&id) {
            Some(node) => node
                .behavior
                .from_notation(node.node_type.properties(), group),
            None => Err(DfgError::not_found("node", id.to_string())),
        };
        if let Err(err) = restored {
            self.remove_node(id)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Serializes the graph: nodes in id order, then every connection in
    /// node, port and connection order.
    pub fn to_notation(&self) -> Result<Value, DfgError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut connections = Vec::new();

        for node in self.nodes.values() {
            nodes.push(Value::Group(node.to_notation()?));
            for (spec, port) in node.node_type.ports().iter().zip(&node.ports) {
                if !spec.is_output() {
                    continue;
                }
                for &dst in &port.connections {
                    let dst_label = self.label(dst)?;
                    connections.push(Value::List(vec![
                        Value::from(node.id.0),
                        Value::from(spec.name()),
                        Value::from(dst.node.0),
                        Value::from(dst_label.port),
                    ]));
                }
            }
        }

        Ok(Value::Group(
            Group::new(GRAPH_GROUP)
                .with("nodes", Value::List(nodes))
                .with("connections", Value::List(connections)),
        ))
    }

    /// Builds a graph from an `am_dfg_graph` description.
    ///
    /// Connections are applied producers first, whatever their order in
    /// the description, so wildcard ports narrow the same way they did when
    /// the graph was built.
    pub fn from_notation(registry: &Registry, value: &Value) -> Result<Self, DfgError> {
        let group = expect_group(value, GRAPH_GROUP)?;
        for (name, _) in group.members() {
            if name != "nodes" && name != "connections" {
                return Err(DfgError::serialization(format!(
                    "unexpected member '{name}' in graph description"
                )));
            }
        }

        let mut graph = Graph::new();
        for node in list_member(group, "nodes")? {
            graph.add_node_from_notation(registry, node)?;
        }

        let mut connections = list_member(group, "connections")?
            .iter()
            .map(|c| graph.parse_connection(c))
            .collect::<Result<Vec<_>, _>>()?;
        producers_first(&mut connections);
        for (src, dst) in connections {
            graph.connect(src, dst)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_load: {} nodes", graph.len());
        Ok(graph)
    }

    /// Parses object-notation text and builds a graph from it.
    pub fn load(registry: &Registry, text: &str) -> Result<Self, DfgError> {
        Self::from_notation(registry, &notation::parse(text)?)
    }

    /// Serializes the graph to object-notation text.
    pub fn save(&self) -> Result<String, DfgError> {
        Ok(self.to_notation()?.to_string())
    }

    /// `[src_id, "src_port", dst_id, "dst_port"]`
    fn parse_connection(&self, value: &Value) -> Result<(PortRef, PortRef), DfgError> {
        let bad = || {
            DfgError::serialization(
                "connection must be [src_id, \"src_port\", dst_id, \"dst_port\"]",
            )
        };
        let [src_id, src_port, dst_id, dst_port] = value.as_list().ok_or_else(bad)? else {
            return Err(bad());
        };
        let src_id = src_id.as_u64().map(NodeId).ok_or_else(bad)?;
        let dst_id = dst_id.as_u64().map(NodeId).ok_or_else(bad)?;
        let src = self.find_port(src_id, src_port.as_str().ok_or_else(bad)?)?;
        let dst = self.find_port(dst_id, dst_port.as_str().ok_or_else(bad)?)?;
        Ok((src, dst))
    }
}

/// Stable-sorts connections by the topological rank of their source node, so
/// that every node's inputs are linked before its outputs. Nodes on a cycle
/// sort last; connecting them fails later with [`DfgError::CycleDetected`].
fn producers_first(connections: &mut [(PortRef, PortRef)]) {
    let mut indegree: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut readers: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for (src, dst) in connections.iter() {
        indegree.entry(src.node).or_default();
        *indegree.entry(dst.node).or_default() += 1;
        readers.entry(src.node).or_default().push(dst.node);
    }

    let mut ready: Vec<NodeId> = indegree
        .iter()
        .filter(|&(_, &deps)| deps == 0)
        .map(|(&node, _)| node)
        .collect();
    let mut rank = BTreeMap::new();
    while let Some(node) = ready.pop() {
        rank.insert(node, rank.len());
        for reader in readers.get(&node).into_iter().flatten() {
            if let Some(deps) = indegree.get_mut(reader) {
                *deps -= 1;
                if *deps == 0 {
                    ready.push(*reader);
                }
            }
        }
    }

    connections.sort_by_key(|(src, _)| rank.get(&src.node).copied().unwrap_or(usize::MAX));
}

fn expect_group<'a>(value: &'a Value, name: &str) -> Result<&'a Group, DfgError> {
    match value {
        Value::Group(group) if group.name() == name => Ok(group),
        Value::Group(group) => Err(DfgError::serialization(format!(
            "expected group '{name}', found '{}'",
            group.name()
        ))),
        other => Err(DfgError::serialization(format!(
            "expected group '{name}', found {}",
            other.kind()
        ))),
    }
}

fn list_member<'a>(group: &'a Group, name: &str) -> Result<&'a [Value], DfgError> {
    match group.get(name) {
        None => Ok(&[]),
        Some(value) => value
            .as_list()
            .ok_or_else(|| DfgError::serialization(format!("'{name}' must be a list"))),
    }
}
