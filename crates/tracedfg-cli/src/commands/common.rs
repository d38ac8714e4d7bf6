//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use tracedfg_config::open_graph;
use tracedfg_core::{Graph, NamedSample, NodeId, PortFlags, PortSpec, Registry, Value};
use tracedfg_nodes::builtin_registry;

/// Registry with the built-in sample and node types.
pub fn registry() -> anyhow::Result<Registry> {
    builtin_registry().context("failed to register built-in node types")
}

/// Loads a graph from a `.toml` pipeline or a `.dfg` topology file.
pub fn load(path: &Path, registry: &Registry) -> anyhow::Result<Graph> {
    open_graph(path, registry).with_context(|| format!("failed to load '{}'", path.display()))
}

/// Parse a `<node id>.<property>=<value>` string for clap's `value_parser`.
///
/// The value is kept as text until the node it applies to is known; see
/// [`property_value`].
pub fn parse_assignment(s: &str) -> Result<(u64, String, String), String> {
    let (target, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid assignment: '{s}' (expected <id>.<property>=<value>)"))?;
    let (id, property) = target
        .split_once('.')
        .ok_or_else(|| format!("Invalid assignment: '{s}' (expected <id>.<property>=<value>)"))?;
    let id = id
        .parse()
        .map_err(|_| format!("Invalid node id '{id}' in '{s}'"))?;
    if property.is_empty() {
        return Err(format!("Missing property name in '{s}'"));
    }
    Ok((id, property.to_string(), value.to_string()))
}

/// Converts `--set` text for a property of node `id`.
///
/// String properties take the text verbatim, so `--set 3.separator=10`
/// sets the string "10". Everything else goes through [`parse_value`].
pub fn property_value(graph: &Graph, id: NodeId, property: &str, text: &str) -> Value {
    let is_string = graph
        .node(id)
        .and_then(|node| node.node_type().find_property(property))
        .is_some_and(|spec| spec.data_type().name() == String::TYPE_NAME);
    if is_string {
        Value::from(text)
    } else {
        parse_value(text)
    }
}

/// Integers, then doubles, then `true`/`false`; anything else is a string.
pub fn parse_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        Value::Int(n)
    } else if let Ok(d) = text.parse::<f64>() {
        Value::Double(d)
    } else if let Ok(b) = text.parse::<bool>() {
        Value::from(b)
    } else {
        Value::from(text)
    }
}

/// Short flag summary of a port, e.g. `in, mandatory`.
pub fn port_flags(spec: &PortSpec) -> String {
    let flags = spec.flags();
    let mut parts = vec![if spec.is_output() { "out" } else { "in" }];
    if flags.contains(PortFlags::MANDATORY) {
        parts.push("mandatory");
    }
    if flags.contains(PortFlags::ON_DEMAND) {
        parts.push("on demand");
    }
    parts.join(", ")
}

/// Number of connections in the graph.
pub fn connection_count(graph: &Graph) -> usize {
    graph
        .nodes()
        .flat_map(|node| {
            node.ports()
                .iter()
                .enumerate()
                .filter(|(i, _)| node.port_spec(*i).is_some_and(PortSpec::is_output))
                .map(|(_, port)| port.num_connections())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("1.value=3.5").unwrap(),
            (1, "value".to_string(), "3.5".to_string())
        );
        assert_eq!(
            parse_assignment("7.separator=a=b").unwrap(),
            (7, "separator".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("value=1").is_err());
        assert!(parse_assignment("x.value=1").is_err());
        assert!(parse_assignment("1.=1").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("-3"), Value::Int(-3));
        assert_eq!(parse_value("2.5"), Value::Double(2.5));
        assert_eq!(parse_value("true"), Value::Int(1));
        assert_eq!(parse_value("hello"), Value::from("hello"));
    }

    #[test]
    fn test_property_value_follows_declared_type() {
        let registry = registry().unwrap();
        let mut graph = Graph::new();
        let concat = graph.add_node(&registry, "am::core::string_concat").unwrap();
        let constant = graph.add_node(&registry, "am::core::uint8_constant").unwrap();

        assert_eq!(
            property_value(&graph, concat, "separator", "3"),
            Value::from("3")
        );
        assert_eq!(
            property_value(&graph, constant, "value", "3"),
            Value::Int(3)
        );
        assert_eq!(
            property_value(&graph, NodeId::new(99), "value", "3"),
            Value::Int(3)
        );
    }
}
