//! Dataflow graph: nodes, ports, buffers and the scheduler.
//!
//! # Architecture
//!
//! - [`Graph`] owns every [`Node`] (keyed by [`NodeId`], iterated in id
//!   order) and an arena of [`Buffer`]s addressed by [`BufferId`]. Ports
//!   store buffer handles and peer [`PortRef`]s, never pointers.
//! - Each output port owns one buffer, created when its node is
//!   instantiated. Connected input ports share it and hold a reference; the
//!   buffer is freed when the last reference goes.
//! - [`Graph::connect`] validates every proposed link (direction, type
//!   compatibility, one writer per input, acyclicity, node-type hooks), so
//!   [`Graph::schedule`] can assume a well-formed acyclic topology.
//! - Node callbacks see the graph only through [`ProcessContext`] (while
//!   processing) and [`HookContext`] (while connecting).
//!
//! # Scheduling
//!
//! A pass checks that every mandatory port is connected, empties all
//! buffers, then executes nodes depth-first from each root in id order.
//! A node runs once all of its connected inputs have been produced. The
//! first failing node aborts the pass and all buffers are emptied again.
//!
//! # Example
//!
//! ```rust,ignore
//! use tracedfg_core::graph::Graph;
//! use tracedfg_core::notation::Value;
//!
//! let registry = tracedfg_nodes::builtin_registry()?;
//! let mut graph = Graph::new();
//! let constant = graph.add_node(&registry, "am::core::double_constant")?;
//! let add = graph.add_node(&registry, "am::core::arithmetic::double::add")?;
//! graph.set_property(constant, "value", &Value::Double(3.14))?;
//! graph.set_property(constant, "num_samples", &Value::Int(2))?;
//! graph.connect_by_name(constant, "out", add, "in")?;
//!
//! graph.schedule()?;
//! let sum = graph.buffer_of(add, "out")?.read_last::<f64>()?;
//! ```

pub mod buffer;
mod context;
pub mod node;
pub mod port;
mod processing;
mod schedule;
mod topology;

pub use buffer::{Buffer, BufferId};
pub use context::{HookContext, ProcessContext};
pub use node::{NODE_GROUP, Node, NodeId};
pub use port::{Port, PortFlags, PortLabel, PortRef, PortSpec};
pub use processing::Graph;
pub use schedule::PassReport;
pub use topology::GRAPH_GROUP;
