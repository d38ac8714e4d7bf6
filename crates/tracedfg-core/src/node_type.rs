//! Node types: port layout, properties and per-instance behaviour.
//!
//! A [`NodeType`] is the immutable template every node of that type is
//! created from. It is assembled with a [`NodeTypeBuilder`], which names
//! port and property types as strings and resolves them against a
//! [`TypeRegistry`] when the type is registered.
//!
//! Per-instance state and callbacks live behind the [`NodeBehavior`] trait;
//! the node type only stores a [`BehaviorFactory`] that creates a fresh
//! behaviour for every instance.

use std::collections::HashSet;
use std::fmt;

use crate::error::DfgError;
use crate::graph::{HookContext, PortFlags, PortSpec, ProcessContext};
use crate::notation::{Group, Value};
use crate::types::{DataType, TypeRef, TypeRegistry};

/// Creates the behaviour object of a new node instance.
pub type BehaviorFactory = fn() -> Box<dyn NodeBehavior>;

/// Dependency annotation of a node type's ports.
///
/// Informational only: every connected input port is a scheduling
/// dependency regardless of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortDeps {
    /// No declared relationship between inputs and outputs.
    #[default]
    None,
    /// Outputs are a pure function of the current inputs.
    PureFunctional,
}

/// Declaration of a node property.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    name: String,
    human_name: String,
    data_type: TypeRef,
}

impl PropertySpec {
    /// Property name as used in object notation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name.
    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    /// Declared value type.
    pub fn data_type(&self) -> &TypeRef {
        &self.data_type
    }
}

/// Per-instance behaviour of a node.
///
/// Only [`process`](Self::process) is required. Every other hook has a
/// default that accepts the operation.
///
/// Connection hooks are called in a fixed order: `pre_connect` on the
/// destination and then on the source, before anything is linked;
/// `connect` on the source and then on the destination, after the ports
/// are linked; `disconnect` on both ends after they are unlinked.
pub trait NodeBehavior: Send {
    /// Called once after the node is created. An error aborts instantiation.
    fn init(&mut self) -> Result<(), DfgError> {
        Ok(())
    }

    /// Reads the node's input buffers and appends to its output buffers.
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError>;

    /// Called once before the node is dropped, if the graph owns its nodes.
    fn destroy(&mut self) {}

    /// Inspects a proposed connection to `port` whose other end carries
    /// `peer_type`. Returning an error refuses the connection with that
    /// message; nothing has been modified at this point.
    fn pre_connect(&self, _port: usize, _peer_type: &DataType) -> Result<(), String> {
        Ok(())
    }

    /// Called after `port` was linked to a peer carrying `peer_type`.
    fn connect(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _port: usize,
        _peer_type: &TypeRef,
    ) -> Result<(), DfgError> {
        Ok(())
    }

    /// Called after a connection on `port` was removed.
    fn disconnect(&mut self, _ctx: &mut HookContext<'_>, _port: usize) -> Result<(), DfgError> {
        Ok(())
    }

    /// Current value of a declared property.
    fn get_property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Updates a declared property. The name has already been checked
    /// against the node type's declarations.
    fn set_property(&mut self, name: &str, _value: &Value) -> Result<(), DfgError> {
        Err(DfgError::invalid_property(name, "property is read-only"))
    }

    /// Appends the node's properties to its notation group.
    fn to_notation(&self, properties: &[PropertySpec], group: &mut Group) -> Result<(), DfgError> {
        for property in properties {
            if let Some(value) = self.get_property(property.name()) {
                group.push(property.name(), value);
            }
        }
        Ok(())
    }

    /// Restores properties from a notation group. Members other than `type`
    /// and `id` must name a declared property.
    fn from_notation(&mut self, properties: &[PropertySpec], group: &Group) -> Result<(), DfgError> {
        for (name, value) in group.members() {
            if name == "type" || name == "id" {
                continue;
            }
            if !properties.iter().any(|p| p.name() == name) {
                return Err(DfgError::serialization(format!(
                    "unexpected member '{name}' in node description"
                )));
            }
            self.set_property(name, value)?;
        }
        Ok(())
    }
}

/// Immutable template for creating nodes.
pub struct NodeType {
    name: String,
    human_name: String,
    ports: Vec<PortSpec>,
    properties: Vec<PropertySpec>,
    deps: PortDeps,
    factory: BehaviorFactory,
}

impl NodeType {
    /// Starts a definition.
    pub fn builder(name: impl Into<String>, human_name: impl Into<String>) -> NodeTypeBuilder {
        NodeTypeBuilder {
            name: name.into(),
            human_name: human_name.into(),
            ports: Vec::new(),
            properties: Vec::new(),
            deps: PortDeps::None,
            factory: None,
        }
    }

    /// Unique name, e.g. `"am::core::select_nth"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name.
    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    /// Port declarations in order. Port indices refer to this slice.
    pub fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    /// Declaration of port `index`.
    pub fn port(&self, index: usize) -> Option<&PortSpec> {
        self.ports.get(index)
    }

    /// Index of the port called `name`.
    pub fn find_port(&self, name: &str) -> Option<usize> {
        self.ports.iter().position(|p| p.name() == name)
    }

    /// Property declarations in order.
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// Declaration of the property called `name`.
    pub fn find_property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Dependency annotation.
    pub fn deps(&self) -> PortDeps {
        self.deps
    }

    /// Number of input ports.
    pub fn num_inputs(&self) -> usize {
        self.ports.iter().filter(|p| p.is_input()).count()
    }

    /// Number of output ports.
    pub fn num_outputs(&self) -> usize {
        self.ports.iter().filter(|p| p.is_output()).count()
    }

    /// Creates the behaviour of a new instance.
    pub fn new_behavior(&self) -> Box<dyn NodeBehavior> {
        (self.factory)()
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("ports", &self.ports)
            .field("properties", &self.properties)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Builder for [`NodeType`].
///
/// ```rust
/// use tracedfg_core::{DfgError, NodeBehavior, NodeType, ProcessContext, TypeRegistry};
///
/// struct Sink;
///
/// impl NodeBehavior for Sink {
///     fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
///         Ok(())
///     }
/// }
///
/// fn sink() -> Box<dyn NodeBehavior> {
///     Box::new(Sink)
/// }
///
/// let types = TypeRegistry::with_builtin_types();
/// let sink = NodeType::builder("demo::sink", "Sink")
///     .mandatory_input("in", "am::core::any")
///     .factory(sink)
///     .build(&types)
///     .unwrap();
/// assert_eq!(sink.find_port("in"), Some(0));
/// ```
#[derive(Debug)]
pub struct NodeTypeBuilder {
    name: String,
    human_name: String,
    ports: Vec<(String, String, PortFlags)>,
    properties: Vec<(String, String, String)>,
    deps: PortDeps,
    factory: Option<BehaviorFactory>,
}

impl NodeTypeBuilder {
    /// Declares a port with explicit flags.
    pub fn port(mut self, name: &str, type_name: &str, flags: PortFlags) -> Self {
        self.ports
            .push((name.to_string(), type_name.to_string(), flags));
        self
    }

    /// Declares an optional input port.
    pub fn input(self, name: &str, type_name: &str) -> Self {
        self.port(name, type_name, PortFlags::IN)
    }

    /// Declares an input port that must be connected for scheduling.
    pub fn mandatory_input(self, name: &str, type_name: &str) -> Self {
        self.port(name, type_name, PortFlags::IN.union(PortFlags::MANDATORY))
    }

    /// Declares an output port that is always produced.
    pub fn output(self, name: &str, type_name: &str) -> Self {
        self.port(name, type_name, PortFlags::OUT)
    }

    /// Declares an output port produced only when connected.
    pub fn on_demand_output(self, name: &str, type_name: &str) -> Self {
        self.port(name, type_name, PortFlags::OUT.union(PortFlags::ON_DEMAND))
    }

    /// Declares a property.
    pub fn property(mut self, name: &str, human_name: &str, type_name: &str) -> Self {
        self.properties.push((
            name.to_string(),
            human_name.to_string(),
            type_name.to_string(),
        ));
        self
    }

    /// Marks outputs as a pure function of the inputs.
    pub fn pure_functional(mut self) -> Self {
        self.deps = PortDeps::PureFunctional;
        self
    }

    /// Sets the behaviour factory.
    pub fn factory(mut self, factory: BehaviorFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Name of the node type being built.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves type names and validates the definition.
    ///
    /// # Errors
    ///
    /// - [`DfgError::NotFound`] if a port or property names an unknown type.
    /// - [`DfgError::InvalidNodeType`] for a missing factory, duplicate
    ///   port or property names, or a port that is not exactly one of
    ///   input and output.
    pub fn build(self, types: &TypeRegistry) -> Result<NodeType, DfgError> {
        let invalid = |reason: String| DfgError::InvalidNodeType {
            node_type: self.name.clone(),
            reason,
        };

        let factory = self
            .factory
            .ok_or_else(|| invalid("no behavior factory".to_string()))?;

        let mut seen = HashSet::new();
        let mut ports = Vec::with_capacity(self.ports.len());
        for (name, type_name, flags) in &self.ports {
            if !seen.insert(name.as_str()) {
                return Err(invalid(format!("duplicate port '{name}'")));
            }
            if flags.contains(PortFlags::IN) == flags.contains(PortFlags::OUT) {
                return Err(invalid(format!(
                    "port '{name}' must be either an input or an output"
                )));
            }
            if flags.contains(PortFlags::OUT) && flags.contains(PortFlags::MANDATORY) {
                return Err(invalid(format!("output port '{name}' cannot be mandatory")));
            }
            ports.push(PortSpec::new(name.clone(), types.lookup(type_name)?, *flags));
        }

        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(self.properties.len());
        for (name, human_name, type_name) in &self.properties {
            if !seen.insert(name.as_str()) {
                return Err(invalid(format!("duplicate property '{name}'")));
            }
            properties.push(PropertySpec {
                name: name.clone(),
                human_name: human_name.clone(),
                data_type: types.lookup(type_name)?,
            });
        }

        Ok(NodeType {
            name: self.name,
            human_name: self.human_name,
            ports,
            properties,
            deps: self.deps,
            factory,
        })
    }
}
