//! Versioned binary stream format for nodegraph graphs.
//!
//! A stream starts with an `i32` version tag followed by the body of that
//! version. Node definitions are persisted by their registry identifier, socket
//! references by name, and override values through a [`ValueSerializers`]
//! table. Only overrides that differ from the socket default are written.
//!
//! # Example
//!
//! ```rust
//! use nodegraph_core::NodeGraph;
//! use nodegraph_registry::{Add, NodeRegistry};
//! use nodegraph_serialize::{ValueSerializers, read_graph, write_graph};
//!
//! let registry = NodeRegistry::<()>::with_builtins();
//! let values = ValueSerializers::with_primitives();
//! let sockets = registry.get_as::<Add>("add").unwrap();
//! let (a, out) = (sockets.a, sockets.out);
//!
//! let mut graph = NodeGraph::new();
//! let id = graph.add_instance(registry.instantiate("add").unwrap().with_override(a, 2.0).unwrap());
//!
//! let mut bytes: Vec<u8> = Vec::new();
//! write_graph(&graph, &registry, &values, &mut bytes).unwrap();
//!
//! let decoded = read_graph(&registry, &values, &mut bytes.as_slice()).unwrap();
//! let copy = decoded.ids[id.index() as usize];
//! let mut round = decoded.graph.new_evaluation_round(());
//! assert_eq!(round.eval(copy).unwrap().get(out), Ok(2.0));
//! ```

pub mod data;
pub mod error;
mod v1;
pub mod values;

use std::io::{Read, Write};

use nodegraph_core::{NodeGraph, NodeId};
use nodegraph_registry::NodeLookup;

pub use data::{DataRead, DataWrite};
pub use error::SerializeError;
pub use values::ValueSerializers;

/// Version written by [`write_graph`].
pub const CURRENT_VERSION: i32 = v1::VERSION;

/// A graph read from a stream.
#[derive(Debug)]
pub struct DecodedGraph<E> {
    /// The rebuilt graph.
    pub graph: NodeGraph<E>,
    /// New ID of each instance, by position in the stream.
    pub ids: Vec<NodeId>,
}

/// Key of the instance at stream position `index`, matching the document format's keys.
pub fn instance_key(index: usize) -> String {
    format!("instance{index:04}")
}

impl<E> DecodedGraph<E> {
    /// Instances paired with their positional keys.
    pub fn keyed_ids(&self) -> impl Iterator<Item = (String, NodeId)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| (instance_key(i), *id))
    }
}

/// Writes the version tag and the graph in the current layout.
pub fn write_graph<E: 'static, W: Write>(
    graph: &NodeGraph<E>,
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
    out: &mut W,
) -> Result<(), SerializeError> {
    tracing::debug!(
        "serialize: version {CURRENT_VERSION}, {} instances, {} connections",
        graph.instance_count(),
        graph.connection_count()
    );
    out.write_i32(CURRENT_VERSION)?;
    v1::write(graph, nodes, values, out)?;
    out.flush()?;
    Ok(())
}

/// Reads a version tag and the graph body for that version.
pub fn read_graph<E: 'static, R: Read>(
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
    input: &mut R,
) -> Result<DecodedGraph<E>, SerializeError> {
    let version = input.read_i32()?;
    tracing::debug!("deserialize: version {version}");
    match version {
        v1::VERSION => v1::read(nodes, values, input),
        v if v > CURRENT_VERSION => Err(SerializeError::UnsupportedVersion(v)),
        v => Err(SerializeError::RetiredVersion(v)),
    }
}

/// Serializes a graph into a byte vector.
pub fn to_bytes<E: 'static>(
    graph: &NodeGraph<E>,
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
) -> Result<Vec<u8>, SerializeError> {
    let mut bytes: Vec<u8> = Vec::new();
    write_graph(graph, nodes, values, &mut bytes)?;
    Ok(bytes)
}

/// Deserializes a graph from a byte slice.
pub fn from_bytes<E: 'static>(
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
    mut bytes: &[u8],
) -> Result<DecodedGraph<E>, SerializeError> {
    read_graph(nodes, values, &mut bytes)
}
