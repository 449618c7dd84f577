//! Evaluate one instance of a graph file.

use std::path::PathBuf;

use clap::Args;
use nodegraph_registry::NodeRegistry;

use super::common::{format_value, load_graph};
use crate::config::CliConfig;

/// Evaluate a graph instance and print its outputs.
#[derive(Args)]
pub struct EvalArgs {
    /// Path to the graph file (`.json` document or binary stream)
    pub file: PathBuf,

    /// Instance key to evaluate (e.g. instance0001)
    #[arg(short, long, value_name = "INSTANCE")]
    pub node: String,

    /// Number of evaluations within one round (state carries over)
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub times: u32,
}

/// Run the eval command.
pub fn run(args: EvalArgs, config: &CliConfig) -> anyhow::Result<()> {
    let registry = NodeRegistry::<()>::with_builtins();
    let loaded = load_graph(&args.file, &registry)?;
    let id = loaded.id(&args.node).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown instance: {} (use 'nodegraph info' to list instances)",
            args.node
        )
    })?;

    let options = config.eval_options();
    tracing::debug!(?options, node = %args.node, times = args.times, "eval");
    let mut round = loaded.graph.new_evaluation_round_with((), options);

    for pass in 1..=args.times {
        let outputs = round.eval(id)?;
        for (name, value) in outputs.iter() {
            if args.times > 1 {
                println!("[{pass}] {name} = {}", format_value(value));
            } else {
                println!("{name} = {}", format_value(value));
            }
        }
    }

    Ok(())
}
