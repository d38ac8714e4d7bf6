//! TOML pipeline descriptions.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracedfg_core::graph::{GRAPH_GROUP, NODE_GROUP};
use tracedfg_core::{Graph, Group, Registry, Value};

use crate::error::ConfigError;

/// A graph described in TOML.
///
/// Nodes carry explicit ids; connections name their endpoints as
/// `"<node id>.<port name>"`. Booleans become the integers 0 and 1.
///
/// # TOML Format
///
/// ```toml
/// name = "pi twice"
///
/// [[nodes]]
/// id = 1
/// type = "am::core::double_constant"
/// [nodes.properties]
/// value = 3.14
/// num_samples = 2
///
/// [[nodes]]
/// id = 2
/// type = "am::core::arithmetic::double::add"
///
/// [[connections]]
/// from = "1.out"
/// to = "2.in"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pipeline {
    /// Name of the pipeline.
    #[serde(default)]
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nodes of the graph.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Connections between node ports.
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

/// One node of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Node id, unique within the pipeline.
    pub id: u64,

    /// Registered node-type name.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Property values by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, toml::Value>,
}

impl NodeConfig {
    /// Create a node without properties.
    pub fn new(id: u64, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A connection `from` an output port `to` an input port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Source endpoint, `"<node id>.<port>"`.
    pub from: String,
    /// Destination endpoint, `"<node id>.<port>"`.
    pub to: String,
}

impl ConnectionConfig {
    /// Create a connection between two endpoints.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a node.
    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a connection.
    pub fn with_connection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connections.push(ConnectionConfig::new(from, to));
        self
    }

    /// Load a pipeline from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a pipeline from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the pipeline to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the pipeline to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Translates the pipeline into an `am_dfg_graph` description.
    pub fn to_notation(&self) -> Result<Value, ConfigError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut group = Group::new(NODE_GROUP)
                .with("type", node.node_type.as_str())
                .with("id", Value::from(node.id));
            for (name, value) in &node.properties {
                let value = from_toml(value).map_err(|reason| ConfigError::UnsupportedValue {
                    node: node.id,
                    property: name.clone(),
                    reason,
                })?;
                group.push(name.as_str(), value);
            }
            nodes.push(Value::Group(group));
        }

        let mut connections = Vec::with_capacity(self.connections.len());
        for connection in &self.connections {
            let (src, src_port) = parse_endpoint(&connection.from)?;
            let (dst, dst_port) = parse_endpoint(&connection.to)?;
            connections.push(Value::List(vec![
                Value::from(src),
                Value::from(src_port),
                Value::from(dst),
                Value::from(dst_port),
            ]));
        }

        Ok(Value::Group(
            Group::new(GRAPH_GROUP)
                .with("nodes", Value::List(nodes))
                .with("connections", Value::List(connections)),
        ))
    }

    /// Instantiates the pipeline.
    pub fn build(&self, registry: &Registry) -> Result<Graph, ConfigError> {
        Ok(Graph::from_notation(registry, &self.to_notation()?)?)
    }

    /// Describes an existing graph as a pipeline.
    pub fn from_graph(name: impl Into<String>, graph: &Graph) -> Result<Self, ConfigError> {
        let mut pipeline = Pipeline::new(name);

        for node in graph.nodes() {
            let id = node.id().value();
            let mut config = NodeConfig::new(id, node.node_type().name());
            for (member, value) in node.to_notation()?.members() {
                if member == "type" || member == "id" {
                    continue;
                }
                let value = to_toml(value).map_err(|reason| ConfigError::UnsupportedValue {
                    node: id,
                    property: member.to_string(),
                    reason,
                })?;
                config.properties.insert(member.to_string(), value);
            }
            pipeline.nodes.push(config);
        }

        let description = graph.to_notation()?;
        let connections = description
            .as_group()
            .and_then(|g| g.get("connections"))
            .and_then(Value::as_list)
            .unwrap_or_default();
        for connection in connections {
            if let Some([src, src_port, dst, dst_port]) = connection.as_list() {
                pipeline.connections.push(ConnectionConfig::new(
                    endpoint(src, src_port),
                    endpoint(dst, dst_port),
                ));
            }
        }
        Ok(pipeline)
    }
}

/// Splits `"<node id>.<port>"` at the first dot. Port names may contain
/// spaces and further dots.
pub fn parse_endpoint(endpoint: &str) -> Result<(u64, &str), ConfigError> {
    let invalid = |reason| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let (id, port) = endpoint
        .split_once('.')
        .ok_or_else(|| invalid("expected '<node id>.<port>'"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| invalid("node id is not a non-negative integer"))?;
    if port.is_empty() {
        return Err(invalid("port name is empty"));
    }
    Ok((id, port))
}

fn endpoint(node: &Value, port: &Value) -> String {
    format!(
        "{}.{}",
        node.as_u64().unwrap_or_default(),
        port.as_str().unwrap_or_default()
    )
}

fn from_toml(value: &toml::Value) -> Result<Value, String> {
    match value {
        toml::Value::String(s) => Ok(Value::String(s.clone())),
        toml::Value::Integer(n) => Ok(Value::Int(*n)),
        toml::Value::Float(d) => Ok(Value::Double(*d)),
        toml::Value::Boolean(b) => Ok(Value::from(*b)),
        toml::Value::Array(items) => items
            .iter()
            .map(from_toml)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        toml::Value::Datetime(_) => Err("datetimes are not supported".to_string()),
        toml::Value::Table(_) => Err("tables are not supported".to_string()),
    }
}

fn to_toml(value: &Value) -> Result<toml::Value, String> {
    match value {
        Value::String(s) => Ok(toml::Value::String(s.clone())),
        Value::Int(n) => Ok(toml::Value::Integer(*n)),
        Value::UInt(n) => Err(format!("{n} exceeds the TOML integer range")),
        Value::Double(d) => Ok(toml::Value::Float(*d)),
        Value::List(items) => items
            .iter()
            .map(to_toml)
            .collect::<Result<Vec<_>, _>>()
            .map(toml::Value::Array),
        Value::Group(g) => Err(format!("group '{}' has no TOML form", g.name())),
    }
}
