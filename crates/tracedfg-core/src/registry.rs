//! Node-type registry and the combined engine registry.
//!
//! A [`Registry`] is built once at startup, then shared read-only (for
//! example behind an `Arc`) by every graph that instantiates nodes from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::DfgError;
use crate::node_type::{NodeType, NodeTypeBuilder};
use crate::types::{DataType, TypeRef, TypeRegistry};

/// Set of known node types, keyed by name.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, Arc<NodeType>>,
}

impl NodeTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node type. Fails with [`DfgError::DuplicateType`] if the name
    /// is taken.
    pub fn register(&mut self, node_type: NodeType) -> Result<Arc<NodeType>, DfgError> {
        if self.types.contains_key(node_type.name()) {
            return Err(DfgError::DuplicateType {
                kind: "node type",
                name: node_type.name().to_string(),
            });
        }
        #[cfg(feature = "tracing")]
        tracing::trace!("register_node_type: {}", node_type.name());
        let node_type = Arc::new(node_type);
        self.types
            .insert(node_type.name().to_string(), Arc::clone(&node_type));
        Ok(node_type)
    }

    /// Looks up a node type by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<NodeType>, DfgError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| DfgError::not_found("node type", name))
    }

    /// All node types, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.types.values()
    }

    /// Number of registered node types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Sample types and node types known to the engine.
#[derive(Debug, Default)]
pub struct Registry {
    types: TypeRegistry,
    node_types: NodeTypeRegistry,
}

impl Registry {
    /// Creates a registry with no types at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in sample types and no node types.
    pub fn with_builtin_types() -> Self {
        Self {
            types: TypeRegistry::with_builtin_types(),
            node_types: NodeTypeRegistry::new(),
        }
    }

    /// Sample types.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Node types.
    pub fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }

    /// Registers a sample type.
    pub fn register_type(&mut self, data_type: DataType) -> Result<TypeRef, DfgError> {
        self.types.register(data_type)
    }

    /// Builds a node type against the registered sample types and registers it.
    pub fn register_node_type(
        &mut self,
        builder: NodeTypeBuilder,
    ) -> Result<Arc<NodeType>, DfgError> {
        let node_type = builder.build(&self.types)?;
        self.node_types.register(node_type)
    }

    /// Looks up a sample type by name.
    pub fn lookup_type(&self, name: &str) -> Result<TypeRef, DfgError> {
        self.types.lookup(name)
    }

    /// Looks up a node type by name.
    pub fn lookup_node_type(&self, name: &str) -> Result<Arc<NodeType>, DfgError> {
        self.node_types.lookup(name)
    }
}
