//! Structured document format for nodegraph graphs.
//!
//! Graphs are encoded into a [`GraphDocument`], a plain serde model that
//! renders as JSON. Instances are keyed `instanceNNNN`, node definitions are
//! named by their registry identifier, and input overrides are stored under
//! `initialValues` through a [`ValueCodecs`] table. Only overrides that differ
//! from the socket default are written.
//!
//! Decoding is forgiving: every problem in a document is collected into a
//! [`DecodeFailure`] that also carries the graph built from the parts that
//! were valid.
//!
//! # Example
//!
//! ```rust
//! use nodegraph_core::NodeGraph;
//! use nodegraph_document::{GraphDocument, ValueCodecs, decode_graph, encode_graph};
//! use nodegraph_registry::{Constant, NodeRegistry};
//!
//! let registry = NodeRegistry::<()>::with_builtins();
//! let values = ValueCodecs::with_primitives();
//! let constant = registry.get_as::<Constant>("constant").unwrap();
//! let (value, out) = (constant.value, constant.out);
//!
//! let mut graph = NodeGraph::new();
//! graph.add_instance(registry.instantiate("constant").unwrap().with_override(value, 3.0).unwrap());
//!
//! let json = encode_graph(&graph, &registry, &values).unwrap().to_json_pretty().unwrap();
//! let document = GraphDocument::from_json(&json).unwrap();
//! let decoded = decode_graph(&document, &registry, &values).unwrap();
//!
//! let id = decoded.id("instance0000").unwrap();
//! let mut round = decoded.graph.new_evaluation_round(());
//! assert_eq!(round.eval(id).unwrap().get(out), Ok(3.0));
//! ```

pub mod codec;
pub mod error;
pub mod model;
pub mod values;

pub use codec::{DecodedDocument, decode_graph, decode_instance, encode_graph, encode_instance};
pub use error::{DecodeFailure, DocumentError};
pub use model::{
    ConnectionDocument, EditorDocument, GraphDocument, InstanceDocument, SocketRefDocument,
    instance_key,
};
pub use values::ValueCodecs;
