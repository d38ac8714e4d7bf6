//! Sample type listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;

use super::common::registry;

#[derive(Args)]
pub struct TypesArgs {}

pub fn run(_args: TypesArgs) -> anyhow::Result<()> {
    let registry = registry()?;

    println!("Sample Types");
    println!("============");
    println!();
    println!("  {:28}  {:6}  {}", "Name", "Size", "Rust type");
    println!("  {:28}  {:6}  {}", "----", "----", "---------");

    for data_type in registry.types().iter() {
        println!(
            "  {:28}  {:6}  {}",
            data_type.name(),
            data_type.sample_size(),
            data_type.rust_type().unwrap_or("(wildcard)")
        );
    }
    Ok(())
}
