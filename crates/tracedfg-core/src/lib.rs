//! tracedfg Core - a typed dataflow graph engine
//!
//! This crate provides the engine for building and running dataflow graphs
//! over trace data: typed sample buffers, nodes with typed ports, validated
//! connections and a dependency-ordered scheduler.
//!
//! # Core Abstractions
//!
//! ## Sample Types
//!
//! - [`DataType`] - Named sample type backed by a Rust type implementing [`Sample`]
//! - [`TypeRegistry`] - Name-keyed set of sample types, with the `am::core` built-ins
//! - [`types_compatible`] - The single type-compatibility rule for connections
//!
//! ## Nodes
//!
//! - [`NodeType`] - Immutable template: ports, properties, behaviour factory
//! - [`NodeBehavior`] - Object-safe trait with the per-instance lifecycle hooks
//! - [`Registry`] - Sample types plus node types, built once and shared
//!
//! ## Graphs
//!
//! - [`Graph`] - Nodes, buffers and connections, with cycle detection
//! - [`Graph::schedule`] - One dependency-ordered pass over all nodes
//! - [`notation`] - Text format for saving and loading topologies
//!
//! # Features
//!
//! - `tracing` - emit `tracing` events for graph mutations and schedule passes
//!
//! # Example
//!
//! ```rust
//! use tracedfg_core::{
//!     DfgError, Graph, NodeBehavior, NodeType, ProcessContext, Registry,
//! };
//!
//! struct Ones;
//!
//! impl NodeBehavior for Ones {
//!     fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
//!         ctx.output(0)?.write(&[1u64, 1, 1])
//!     }
//! }
//!
//! fn ones() -> Box<dyn NodeBehavior> {
//!     Box::new(Ones)
//! }
//!
//! let mut registry = Registry::with_builtin_types();
//! registry
//!     .register_node_type(
//!         NodeType::builder("demo::ones", "Ones")
//!             .output("out", "am::core::uint64")
//!             .factory(ones),
//!     )
//!     .unwrap();
//!
//! let mut graph = Graph::new();
//! let id = graph.add_node(&registry, "demo::ones").unwrap();
//! graph.schedule().unwrap();
//! assert_eq!(graph.buffer_of(id, "out").unwrap().len(), 3);
//! ```

pub mod error;
pub mod graph;
pub mod node_type;
pub mod notation;
pub mod registry;
pub mod types;

// Re-export main types at crate root
pub use error::DfgError;
pub use graph::{
    Buffer, BufferId, Graph, HookContext, Node, NodeId, PassReport, Port, PortFlags, PortLabel,
    PortRef, PortSpec, ProcessContext,
};
pub use node_type::{BehaviorFactory, NodeBehavior, NodeType, NodeTypeBuilder, PortDeps, PropertySpec};
pub use notation::{Group, ParseError, Value};
pub use registry::{NodeTypeRegistry, Registry};
pub use types::{
    ANY_TYPE_NAME, DataType, Interval, NamedSample, Sample, Timestamp, TypeRef, TypeRegistry,
    types_compatible,
};
