//! Graph validation command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracedfg_config::{Pipeline, is_pipeline, validate_pipeline};

use super::common::{connection_count, load, registry};

#[derive(Args)]
pub struct CheckArgs {
    /// Graph file (.toml pipeline or .dfg topology)
    file: PathBuf,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let registry = registry()?;

    if is_pipeline(&args.file) {
        let pipeline = Pipeline::load(&args.file)
            .with_context(|| format!("failed to load '{}'", args.file.display()))?;
        validate_pipeline(&pipeline, &registry)
            .with_context(|| format!("'{}' is not a valid pipeline", args.file.display()))?;
    }

    let graph = load(&args.file, &registry)?;

    let mut problems = 0;
    for node in graph.nodes() {
        if let Some(spec) = node.unconnected_mandatory_port() {
            println!(
                "node {} ({}): mandatory port \"{}\" is unconnected",
                node.id(),
                node.node_type().name(),
                spec.name()
            );
            problems += 1;
        }
    }
    if problems > 0 {
        anyhow::bail!(
            "'{}' cannot be scheduled: {} node(s) not well connected",
            args.file.display(),
            problems
        );
    }

    println!(
        "{}: ok ({} nodes, {} connections)",
        args.file.display(),
        graph.len(),
        connection_count(&graph)
    );
    Ok(())
}
