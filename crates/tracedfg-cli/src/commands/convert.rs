//! Graph file conversion command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracedfg_config::{Pipeline, is_pipeline, save_graph};

use super::common::{load, registry};

#[derive(Args)]
pub struct ConvertArgs {
    /// Input graph file (.toml or .dfg)
    input: PathBuf,

    /// Output graph file; the extension picks the format
    output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite.",
            args.output.display()
        );
    }

    let registry = registry()?;
    let graph = load(&args.input, &registry)?;

    if is_pipeline(&args.output) {
        let name = args
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Pipeline::from_graph(name, &graph)
            .and_then(|pipeline| pipeline.save(&args.output))
            .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    } else {
        save_graph(&graph, &args.output)
            .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    }

    println!(
        "Converted {} -> {} ({} nodes)",
        args.input.display(),
        args.output.display(),
        graph.len()
    );
    Ok(())
}
