//! Node catalog listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use nodegraph_registry::{NodeCategory, NodeRegistry};

/// List the node catalog or show one node's sockets.
#[derive(Args)]
pub struct NodesArgs {
    /// Show sockets of a specific node
    #[arg(value_name = "ID")]
    pub id: Option<String>,
}

/// Run the nodes command.
pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::<()>::with_builtins();

    let Some(id) = &args.id else {
        println!("Available Nodes");
        println!("===============");
        for category in [
            NodeCategory::Source,
            NodeCategory::Math,
            NodeCategory::Stateful,
            NodeCategory::Utility,
        ] {
            let mut nodes = registry.in_category(category).peekable();
            if nodes.peek().is_none() {
                continue;
            }
            println!();
            println!("{}:", category.name());
            for node in nodes {
                println!("  {:12}  {}", node.id, node.description);
            }
        }
        println!();
        println!("Use 'nodegraph nodes <ID>' for socket details.");
        return Ok(());
    };

    let descriptor = registry
        .descriptor(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown node: {}", id))?;
    let definition = registry
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown node: {}", id))?;

    println!("{} ({})", descriptor.name, descriptor.id);
    println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
    println!();
    println!("{}", descriptor.description);
    if !definition.should_cache() {
        println!("Re-processed on every read (not cached).");
    }
    println!();

    println!("Inputs:");
    println!("  {:12}  {:8}  {}", "Name", "Type", "Default");
    println!("  {:12}  {:8}  {}", "----", "----", "-------");
    for (_, socket) in definition.ports().inputs() {
        let default = socket
            .default_value()
            .map_or_else(|| "-".to_owned(), |v| format!("{v:?}"));
        println!(
            "  {:12}  {:8}  {}",
            socket.name(),
            socket.value_type().name(),
            default
        );
    }
    println!();

    println!("Outputs:");
    println!("  {:12}  {}", "Name", "Type");
    println!("  {:12}  {}", "----", "----");
    for (_, socket) in definition.ports().outputs() {
        println!("  {:12}  {}", socket.name(), socket.value_type().name());
    }

    Ok(())
}
