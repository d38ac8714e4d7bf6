//! Node type listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use tracedfg_core::PortDeps;

use super::common::{port_flags, registry};

#[derive(Args)]
pub struct NodesArgs {
    /// Show ports and properties of a specific node type
    #[arg(value_name = "NODE_TYPE")]
    node_type: Option<String>,

    /// Only list node types whose name contains this text
    #[arg(long)]
    filter: Option<String>,
}

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = registry()?;

    if let Some(name) = &args.node_type {
        let node_type = registry
            .lookup_node_type(name)
            .map_err(|_| anyhow::anyhow!("Unknown node type: {}", name))?;

        println!("{}", node_type.name());
        println!("{}", "=".repeat(node_type.name().len()));
        println!();
        println!("{}", node_type.human_name());
        if node_type.deps() == PortDeps::PureFunctional {
            println!("Outputs are a pure function of the inputs.");
        }
        println!();

        println!("Ports:");
        println!();
        println!("  {:20}  {:24}  {}", "Name", "Type", "Flags");
        println!("  {:20}  {:24}  {}", "----", "----", "-----");
        for spec in node_type.ports() {
            println!(
                "  {:20}  {:24}  {}",
                spec.name(),
                spec.data_type().name(),
                port_flags(spec)
            );
        }

        if !node_type.properties().is_empty() {
            println!();
            println!("Properties:");
            println!();
            println!("  {:20}  {:24}  {}", "Name", "Type", "Description");
            println!("  {:20}  {:24}  {}", "----", "----", "-----------");
            for property in node_type.properties() {
                println!(
                    "  {:20}  {:24}  {}",
                    property.name(),
                    property.data_type().name(),
                    property.human_name()
                );
            }
        }
        return Ok(());
    }

    println!("Available Node Types");
    println!("====================");
    println!();

    let mut shown = 0;
    for node_type in registry.node_types().iter() {
        if let Some(filter) = &args.filter
            && !node_type.name().contains(filter.as_str())
        {
            continue;
        }
        println!("  {:50} - {}", node_type.name(), node_type.human_name());
        shown += 1;
    }

    if shown == 0 {
        println!("  (no matching node types)");
    }
    println!();
    println!("Use 'tracedfg nodes <name>' for port and property details.");
    Ok(())
}
