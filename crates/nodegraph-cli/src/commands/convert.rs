//! Convert a graph file between the document and binary formats.

use std::path::PathBuf;

use clap::Args;
use nodegraph_registry::NodeRegistry;

use super::common::{GraphFormat, load_graph, save_graph};

/// Convert a graph file; formats follow the file extensions.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input graph file
    pub input: PathBuf,

    /// Output graph file (`.json` writes a document, anything else a binary stream)
    pub output: PathBuf,
}

/// Run the convert command.
pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::<()>::with_builtins();
    let loaded = load_graph(&args.input, &registry)?;
    save_graph(&loaded.graph, &args.output, &registry)?;

    println!(
        "Converted {} ({}) -> {} ({}): {} instances, {} connections",
        args.input.display(),
        GraphFormat::from_path(&args.input).name(),
        args.output.display(),
        GraphFormat::from_path(&args.output).name(),
        loaded.graph.instance_count(),
        loaded.graph.connection_count()
    );
    Ok(())
}
