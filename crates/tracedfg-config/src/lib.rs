//! Graph files and pipeline descriptions for the tracedfg dataflow engine.
//!
//! This crate moves graphs between memory and disk in two formats:
//!
//! - **Object notation** (`.dfg`): the engine's own topology format, as
//!   written by [`Graph::save`](tracedfg_core::Graph::save)
//! - **Pipelines** (`.toml`): a hand-editable TOML description with nodes,
//!   properties and `"<id>.<port>"` connections
//!
//! # Example
//!
//! ```rust,no_run
//! use tracedfg_config::{NodeConfig, Pipeline, save_graph};
//! use tracedfg_core::Registry;
//!
//! let registry = Registry::with_builtin_types();
//! let pipeline = Pipeline::load("pipelines/pi.toml").unwrap();
//! let graph = pipeline.build(&registry).unwrap();
//! save_graph(&graph, "out/pi.dfg").unwrap();
//!
//! let pipeline = Pipeline::new("pi")
//!     .with_node(NodeConfig::new(1, "am::core::double_constant").with_property("value", 3.14))
//!     .with_node(NodeConfig::new(2, "am::core::arithmetic::double::add"))
//!     .with_connection("1.out", "2.in");
//! pipeline.save("pipelines/pi.toml").unwrap();
//! ```

mod error;
mod graph_file;
mod pipeline;

/// Pipeline validation.
pub mod validation;

pub use error::ConfigError;
pub use graph_file::{
    GRAPH_EXTENSION, PIPELINE_EXTENSION, is_pipeline, load_graph, open_graph, save_graph,
};
pub use pipeline::{ConnectionConfig, NodeConfig, Pipeline, parse_endpoint};
pub use validation::{ValidationError, ValidationResult, validate_pipeline};
