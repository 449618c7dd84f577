//! Shared CLI helpers used across multiple commands.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use nodegraph_core::{NodeGraph, NodeId, Value};
use nodegraph_document::{GraphDocument, ValueCodecs, decode_graph, encode_graph};
use nodegraph_registry::NodeRegistry;
use nodegraph_serialize::{ValueSerializers, from_bytes, to_bytes};

/// On-disk encoding of a graph file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// `.json` document.
    Document,
    /// Versioned binary stream (any other extension).
    Binary,
}

impl GraphFormat {
    /// Format implied by the file name.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => GraphFormat::Document,
            _ => GraphFormat::Binary,
        }
    }

    /// Name shown in listings.
    pub fn name(self) -> &'static str {
        match self {
            GraphFormat::Document => "JSON document",
            GraphFormat::Binary => "binary stream",
        }
    }
}

/// A graph file after decoding, with the key of every instance.
pub struct LoadedGraph {
    /// The graph.
    pub graph: NodeGraph<()>,
    /// Instance keys in file order.
    pub keys: Vec<(String, NodeId)>,
}

impl LoadedGraph {
    /// Instance stored under `key`.
    pub fn id(&self, key: &str) -> Option<NodeId> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, id)| *id)
    }

    /// Key lookup table by instance ID.
    pub fn key_map(&self) -> HashMap<NodeId, &str> {
        self.keys.iter().map(|(k, id)| (*id, k.as_str())).collect()
    }
}

/// Reads a graph file in the format implied by its extension.
pub fn load_graph(path: &Path, registry: &NodeRegistry<()>) -> anyhow::Result<LoadedGraph> {
    match GraphFormat::from_path(path) {
        GraphFormat::Document => {
            let document = GraphDocument::load(path)?;
            let decoded = decode_graph(&document, registry, &ValueCodecs::with_primitives())
                .map_err(|failure| anyhow::anyhow!("{}: {failure}", path.display()))?;
            Ok(LoadedGraph {
                graph: decoded.graph,
                keys: decoded.ids.into_iter().collect(),
            })
        }
        GraphFormat::Binary => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read file '{}'", path.display()))?;
            let decoded = from_bytes(registry, &ValueSerializers::with_primitives(), &bytes)
                .with_context(|| format!("failed to decode '{}'", path.display()))?;
            let keys = decoded.keyed_ids().collect();
            Ok(LoadedGraph {
                graph: decoded.graph,
                keys,
            })
        }
    }
}

/// Writes a graph file in the format implied by its extension.
pub fn save_graph(
    graph: &NodeGraph<()>,
    path: &Path,
    registry: &NodeRegistry<()>,
) -> anyhow::Result<()> {
    match GraphFormat::from_path(path) {
        GraphFormat::Document => {
            encode_graph(graph, registry, &ValueCodecs::with_primitives())?.save(path)?;
        }
        GraphFormat::Binary => {
            let bytes = to_bytes(graph, registry, &ValueSerializers::with_primitives())?;
            std::fs::write(path, bytes)
                .with_context(|| format!("failed to write file '{}'", path.display()))?;
        }
    }
    Ok(())
}

/// Renders a socket value for display.
pub fn format_value(value: &Value) -> String {
    format!("{value:?}")
}
