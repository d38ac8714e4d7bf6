//! Graph execution command.
//!
//! Loads a graph, applies property overrides, runs one or more schedule
//! passes and prints the samples left in every output buffer.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracedfg_core::{Graph, NodeId, PassReport};

use super::common::{load, parse_assignment, property_value, registry};

#[derive(Args)]
pub struct RunArgs {
    /// Graph file (.toml pipeline or .dfg topology)
    file: PathBuf,

    /// Number of schedule passes
    #[arg(short, long, default_value = "1")]
    passes: u32,

    /// Set a property before running (e.g., "1.value=3.5"); repeatable
    #[arg(long = "set", value_parser = parse_assignment)]
    set: Vec<(u64, String, String)>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let registry = registry()?;
    let mut graph = load(&args.file, &registry)?;

    for (id, property, text) in &args.set {
        let node = NodeId::new(*id);
        let value = property_value(&graph, node, property, text);
        graph
            .set_property(node, property, &value)
            .with_context(|| format!("failed to set property '{property}' of node {id}"))?;
    }

    let mut report = PassReport::default();
    for pass in 1..=args.passes {
        report = graph
            .schedule()
            .with_context(|| format!("schedule pass {pass} failed"))?;
        tracing::info!("pass {pass}: executed {} nodes", report.len());
    }

    if args.json {
        let json = to_json(&graph, &report, args.passes);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_outputs(&graph, &report);
    }
    Ok(())
}

/// `(port name, type name, formatted samples)` of every output port.
fn outputs(graph: &Graph, id: NodeId) -> Vec<(String, String, Vec<String>)> {
    let Some(node) = graph.node(id) else {
        return Vec::new();
    };
    node.node_type()
        .ports()
        .iter()
        .filter(|spec| spec.is_output())
        .filter_map(|spec| {
            let buffer = graph.buffer_of(id, spec.name()).ok()?;
            Some((
                spec.name().to_string(),
                buffer.data_type().name().to_string(),
                buffer.format_all(),
            ))
        })
        .collect()
}

fn print_outputs(graph: &Graph, report: &PassReport) {
    for node in graph.nodes() {
        println!("node {} ({})", node.id(), node.node_type().name());
        for (port, type_name, samples) in outputs(graph, node.id()) {
            println!("  {port} [{type_name}]: {}", samples.join(", "));
        }
    }
    let order: Vec<String> = report.executed().iter().map(ToString::to_string).collect();
    println!();
    println!("Execution order: {}", order.join(" -> "));
}

fn to_json(graph: &Graph, report: &PassReport, passes: u32) -> serde_json::Value {
    let nodes: Vec<serde_json::Value> = graph
        .nodes()
        .map(|node| {
            let outputs: serde_json::Map<String, serde_json::Value> =
                outputs(graph, node.id())
                    .into_iter()
                    .map(|(port, type_name, samples)| {
                        (
                            port,
                            serde_json::json!({ "type": type_name, "samples": samples }),
                        )
                    })
                    .collect();
            serde_json::json!({
                "id": node.id().value(),
                "type": node.node_type().name(),
                "outputs": outputs,
            })
        })
        .collect();

    serde_json::json!({
        "passes": passes,
        "executed": report.executed().iter().map(|id| id.value()).collect::<Vec<_>>(),
        "nodes": nodes,
    })
}
