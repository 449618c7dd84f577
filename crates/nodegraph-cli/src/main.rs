//! nodegraph CLI - inspect, evaluate and convert node graph files.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "nodegraph")]
#[command(author, version, about = "Dataflow node graph CLI", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log graph edits and evaluation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available nodes and their sockets
    Nodes(commands::nodes::NodesArgs),

    /// Show the instances and connections of a graph file
    Info(commands::info::InfoArgs),

    /// Evaluate one instance of a graph file
    Eval(commands::eval::EvalArgs),

    /// Convert between JSON documents and binary streams
    Convert(commands::convert::ConvertArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Eval(args) => commands::eval::run(args, &config),
        Commands::Convert(args) => commands::convert::run(args),
    }
}
