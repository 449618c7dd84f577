//! Typed dataflow node graphs with demand-driven, memoized evaluation.
//!
//! A [`NodeGraph`] holds [`NodeInstance`]s of reusable [`NodeDefinition`]s and
//! the connections between their typed sockets. Values are computed lazily by
//! an [`EvaluationRound`]: asking for a node's outputs pulls exactly the
//! upstream values that node reads.
//!
//! # Architecture
//!
//! - [`value`]: type-erased socket values ([`Value`]) and runtime type tags ([`ValueType`])
//! - [`socket`]: socket descriptors, the ordered [`PortList`] of a definition and typed handles
//! - [`node`]: the [`NodeDefinition`] trait, shared [`Definition`] handles and the [`ProcessContext`]
//! - [`instance`]: [`NodeInstance`] with per-input overrides and [`EditorData`]
//! - [`graph`]: the [`NodeGraph`] topology
//! - [`round`]: [`EvaluationRound`] with per-call caching and per-round state
//!
//! # Example
//!
//! ```rust,ignore
//! use nodegraph_core::{NodeGraph, NodeInstance, Definition};
//!
//! let add = Definition::new(Add::new());
//! let handles = add.downcast_ref::<Add>().unwrap();
//! let (a, b, sum) = (handles.a, handles.b, handles.sum);
//!
//! let mut graph = NodeGraph::new();
//! let x = graph.add_instance(NodeInstance::new(add.clone()).with_override(a, 1.0)?);
//! let y = graph.add_instance(NodeInstance::new(add.clone()).with_override(b, 4.0)?);
//! graph.connect(x.at(sum), y.at(a))?;
//!
//! let mut round = graph.new_evaluation_round(());
//! assert_eq!(round.eval(y)?.get(sum)?, 5.0);
//! ```
//!
//! # Features
//!
//! - `tracing`: emit `tracing` events for graph edits and evaluation steps.

pub mod error;
pub mod graph;
pub mod instance;
pub mod node;
pub mod round;
pub mod socket;
pub mod value;

pub use error::{EvalError, GraphError};
pub use graph::{Connection, Endpoint, NodeGraph, NodeId};
pub use instance::{EditorData, NodeInstance};
pub use node::{Definition, NodeDefinition, ProcessContext};
pub use round::{CyclePolicy, EvalOptions, EvaluationRound, Outputs};
pub use socket::{Direction, InputSocket, OutputSocket, PortId, PortList, PortListBuilder, Socket};
pub use value::{SocketValue, Value, ValueType};
