//! tracedfg CLI - build, inspect and run dataflow graphs from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tracedfg")]
#[command(author, version, about = "tracedfg dataflow graph CLI", long_about = None)]
struct Cli {
    /// Log graph mutations and schedule passes (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered sample types
    Types(commands::types::TypesArgs),

    /// List node types, or show the ports and properties of one
    Nodes(commands::nodes::NodesArgs),

    /// Run schedule passes over a graph and print its output buffers
    Run(commands::run::RunArgs),

    /// Convert between pipeline (.toml) and object-notation (.dfg) files
    Convert(commands::convert::ConvertArgs),

    /// Validate a graph file without running it
    Check(commands::check::CheckArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Types(args) => commands::types::run(args),
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Check(args) => commands::check::run(args),
    }
}
