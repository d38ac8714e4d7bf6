//! Graph topology files in object notation.

use std::path::Path;

use tracedfg_core::{Graph, Registry};

use crate::error::ConfigError;
use crate::pipeline::Pipeline;

/// File extension of object-notation graph files.
pub const GRAPH_EXTENSION: &str = "dfg";

/// File extension of TOML pipeline descriptions.
pub const PIPELINE_EXTENSION: &str = "toml";

/// Loads a graph from an object-notation file.
pub fn load_graph(path: impl AsRef<Path>, registry: &Registry) -> Result<Graph, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    Ok(Graph::load(registry, &content)?)
}

/// Saves a graph to an object-notation file, creating parent directories.
pub fn save_graph(graph: &Graph, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    let mut content = graph.save()?;
    content.push('\n');
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
    Ok(())
}

/// Loads a graph from either format, chosen by extension: `.toml` files are
/// pipeline descriptions, everything else is object notation.
pub fn open_graph(path: impl AsRef<Path>, registry: &Registry) -> Result<Graph, ConfigError> {
    let path = path.as_ref();
    if is_pipeline(path) {
        Pipeline::load(path)?.build(registry)
    } else {
        load_graph(path, registry)
    }
}

/// Returns `true` if `path` names a TOML pipeline description.
pub fn is_pipeline(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PIPELINE_EXTENSION))
}
