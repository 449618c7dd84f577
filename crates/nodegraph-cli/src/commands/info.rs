//! Display the contents of a graph file.

use std::path::PathBuf;

use clap::Args;
use nodegraph_registry::NodeRegistry;

use super::common::{GraphFormat, format_value, load_graph};

/// Display graph file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the graph file (`.json` document or binary stream)
    pub file: PathBuf,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::<()>::with_builtins();
    let loaded = load_graph(&args.file, &registry)?;
    let keys = loaded.key_map();
    let graph = &loaded.graph;

    println!("File:        {}", args.file.display());
    println!("Format:      {}", GraphFormat::from_path(&args.file).name());
    println!("Instances:   {}", graph.instance_count());
    println!("Connections: {}", graph.connection_count());

    for (key, id) in &loaded.keys {
        let Some(instance) = graph.instance(*id) else {
            continue;
        };
        let definition = instance.definition();
        let node_type = registry.id_of(definition).unwrap_or(definition.label());
        println!();
        match instance.editor() {
            Some(editor) => println!(
                "{key}: {node_type} \"{}\" at ({}, {})",
                editor.display_name, editor.x, editor.y
            ),
            None => println!("{key}: {node_type}"),
        }
        for (port, value) in instance.changed_overrides() {
            if let Some(socket) = definition.ports().get(port) {
                println!("  {} = {}", socket.name(), format_value(value));
            }
        }
    }

    if graph.connection_count() > 0 {
        println!();
        println!("Connections:");
        for connection in graph.connections() {
            let (src, dst) = (connection.source, connection.destination);
            println!(
                "  {}.{} -> {}.{}",
                keys.get(&src.node).copied().unwrap_or("?"),
                socket_name(graph, src.node, src.port),
                keys.get(&dst.node).copied().unwrap_or("?"),
                socket_name(graph, dst.node, dst.port),
            );
        }
    }

    Ok(())
}

fn socket_name(
    graph: &nodegraph_core::NodeGraph<()>,
    node: nodegraph_core::NodeId,
    port: nodegraph_core::PortId,
) -> &str {
    graph
        .instance(node)
        .and_then(|inst| inst.definition().ports().get(port))
        .map_or("?", |s| s.name())
}
