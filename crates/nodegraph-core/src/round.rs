//! Demand-driven evaluation of a node graph.
//!
//! An [`EvaluationRound`] pulls values backward from a requested node: it
//! processes the node, and whenever the node reads a connected input the
//! upstream node is evaluated first. Unconnected inputs resolve to the
//! instance override or the socket default.
//!
//! # Caching
//!
//! Each call to [`eval`](EvaluationRound::eval) works on its own output cache.
//! A caching node (`should_cache() == true`) is processed at most once per
//! call, however many inputs it feeds. A non-caching node is processed again
//! on every pull. Nothing is reused across calls.
//!
//! # State
//!
//! Per-instance state is created lazily with `init_state` the first time an
//! instance is processed, then kept for every later call on the same round.
//! A new round starts from fresh state.
//!
//! # Cycles
//!
//! The graph does not reject cycles. What happens when evaluation re-enters an
//! instance that is still processing is governed by [`CyclePolicy`].

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::EvalError;
use crate::graph::{NodeGraph, NodeId};
use crate::instance::NodeInstance;
use crate::node::{Definition, NodeIo, expect_socket};
use crate::socket::{Direction, OutputSocket, PortId};
use crate::value::{SocketValue, Value, ValueType};

/// What to do when evaluation re-enters an instance that is still processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CyclePolicy {
    /// Fail with [`EvalError::CycleDetected`].
    #[default]
    Error,
    /// Hand a caching node's partially written outputs to the re-entrant
    /// reader; reading an output not yet written fails with
    /// [`EvalError::MissingOutput`]. Non-caching nodes still fail with
    /// [`EvalError::CycleDetected`].
    PartialOutputs,
}

/// Options for an evaluation round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Re-entry behaviour.
    pub cycle_policy: CyclePolicy,
    /// Maximum nesting of upstream resolution, `None` for unlimited.
    pub max_depth: Option<usize>,
}

impl EvalOptions {
    /// Sets the cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Sets the depth limit.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

type OutputMap = BTreeMap<PortId, Value>;

/// Working memory of one top-level `eval` call.
#[derive(Default)]
struct Pass {
    outputs: HashMap<NodeId, OutputMap>,
    computing: HashSet<NodeId>,
    finished: HashSet<NodeId>,
    depth: usize,
}

/// A session of evaluations over one graph.
///
/// The round borrows the graph, so the topology cannot change while it is
/// alive. Drop the round and start a new one after editing the graph.
pub struct EvaluationRound<'g, E> {
    graph: &'g NodeGraph<E>,
    environment: E,
    states: HashMap<NodeId, Box<dyn Any>>,
    options: EvalOptions,
}

impl<'g, E: 'static> EvaluationRound<'g, E> {
    pub(crate) fn new(graph: &'g NodeGraph<E>, environment: E, options: EvalOptions) -> Self {
        Self {
            graph,
            environment,
            states: HashMap::new(),
            options,
        }
    }

    /// Graph being evaluated.
    pub fn graph(&self) -> &'g NodeGraph<E> {
        self.graph
    }

    /// Environment shared by every node.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Mutable environment, e.g. to advance a clock between evaluations.
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    /// Ends the round and returns its environment.
    pub fn into_environment(self) -> E {
        self.environment
    }

    /// Options this round was created with.
    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Persistent state of an instance, if it has been processed in this round.
    pub fn state<S: 'static>(&self, node: NodeId) -> Option<&S> {
        self.states.get(&node).and_then(|s| s.downcast_ref::<S>())
    }

    /// Number of instances that hold state in this round.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Evaluates a node, pulling whatever upstream values it reads.
    pub fn eval(&mut self, node: NodeId) -> Result<Outputs<E>, EvalError> {
        let graph = self.graph;
        let instance = graph.instance(node).ok_or(EvalError::NodeNotFound(node))?;
        #[cfg(feature = "tracing")]
        tracing::debug!("eval: {node} ({})", instance.definition().label());

        let mut pass = Pass::default();
        let values = self.resolve(&mut pass, node)?;
        Ok(Outputs {
            node,
            definition: instance.definition().clone(),
            values,
        })
    }

    fn resolve(&mut self, pass: &mut Pass, node: NodeId) -> Result<OutputMap, EvalError> {
        let graph = self.graph;
        let instance = graph.instance(node).ok_or(EvalError::NodeNotFound(node))?;
        let definition = instance.definition();
        let caches = definition.should_cache();

        if pass.computing.contains(&node) {
            return match (self.options.cycle_policy, caches) {
                (CyclePolicy::PartialOutputs, true) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("eval: {node} re-entered, using partial outputs");
                    Ok(pass.outputs.get(&node).cloned().unwrap_or_default())
                }
                _ => Err(EvalError::CycleDetected { node }),
            };
        }
        if caches
            && pass.finished.contains(&node)
            && let Some(values) = pass.outputs.get(&node)
        {
            return Ok(values.clone());
        }
        if let Some(limit) = self.options.max_depth
            && pass.depth >= limit
        {
            return Err(EvalError::DepthExceeded { node, limit });
        }

        // Reserve the slot before processing so re-entrant readers find it.
        pass.outputs.insert(node, OutputMap::new());
        pass.computing.insert(node);
        pass.depth += 1;

        let mut state = self
            .states
            .remove(&node)
            .unwrap_or_else(|| definition.init_state());
        #[cfg(feature = "tracing")]
        tracing::trace!("eval: process {node} at depth {}", pass.depth);
        let result = {
            let mut io = InstanceIo {
                round: &mut *self,
                pass: &mut *pass,
                node,
                instance,
            };
            definition.process(&mut *state, &mut io)
        };
        self.states.insert(node, state);

        pass.depth -= 1;
        pass.computing.remove(&node);
        result?;
        pass.finished.insert(node);
        Ok(pass.outputs.get(&node).cloned().unwrap_or_default())
    }
}

impl<E> std::fmt::Debug for EvaluationRound<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationRound")
            .field("graph", self.graph)
            .field("states", &self.states.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Value access for the instance currently processing.
struct InstanceIo<'r, 'g, E> {
    round: &'r mut EvaluationRound<'g, E>,
    pass: &'r mut Pass,
    node: NodeId,
    instance: &'g NodeInstance<E>,
}

impl<E: 'static> NodeIo<E> for InstanceIo<'_, '_, E> {
    fn node(&self) -> NodeId {
        self.node
    }

    fn environment(&mut self) -> &mut E {
        &mut self.round.environment
    }

    fn read_input(&mut self, port: PortId) -> Result<Value, EvalError> {
        let instance = self.instance;
        let ports = instance.definition().ports();
        let socket = expect_socket(ports, self.node, port, Direction::Input)?;

        let Some(source) = self.round.graph.source_of(self.node.at(port)) else {
            return instance
                .effective_value(port)
                .ok_or_else(|| EvalError::PortNotFound {
                    node: self.node,
                    port,
                });
        };

        let upstream = self.round.resolve(self.pass, source.node)?;
        let value = upstream.get(&source.port).cloned().ok_or_else(|| {
            EvalError::MissingOutput {
                node: source.node,
                socket: output_name(self.round.graph, source.node, source.port),
            }
        })?;
        if value.value_type() != socket.value_type() {
            return Err(EvalError::TypeMismatch {
                node: self.node,
                socket: socket.name().to_owned(),
                expected: socket.value_type(),
                found: value.value_type(),
            });
        }
        Ok(value)
    }

    fn write_output(&mut self, port: PortId, value: Value) -> Result<(), EvalError> {
        let ports = self.instance.definition().ports();
        let socket = expect_socket(ports, self.node, port, Direction::Output)?;
        if value.value_type() != socket.value_type() {
            return Err(EvalError::TypeMismatch {
                node: self.node,
                socket: socket.name().to_owned(),
                expected: socket.value_type(),
                found: value.value_type(),
            });
        }
        self.pass
            .outputs
            .entry(self.node)
            .or_default()
            .insert(port, value);
        Ok(())
    }
}

fn output_name<E: 'static>(graph: &NodeGraph<E>, node: NodeId, port: PortId) -> String {
    graph
        .instance(node)
        .and_then(|inst| inst.definition().ports().get(port))
        .map(|s| s.name().to_owned())
        .unwrap_or_default()
}

/// Outputs a node wrote during one evaluation.
pub struct Outputs<E> {
    node: NodeId,
    definition: Definition<E>,
    values: OutputMap,
}

impl<E: 'static> Outputs<E> {
    /// Node these outputs belong to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Reads a typed output.
    pub fn get<V: SocketValue + Clone>(&self, socket: OutputSocket<V>) -> Result<V, EvalError> {
        let value = self.get_value(socket.port())?;
        value.get::<V>().ok_or_else(|| EvalError::TypeMismatch {
            node: self.node,
            socket: self.socket_name(socket.port()),
            expected: ValueType::of::<V>(),
            found: value.value_type(),
        })
    }

    /// Reads an output by port.
    pub fn get_value(&self, port: PortId) -> Result<&Value, EvalError> {
        let socket = expect_socket(self.definition.ports(), self.node, port, Direction::Output)?;
        self.values
            .get(&port)
            .ok_or_else(|| EvalError::MissingOutput {
                node: self.node,
                socket: socket.name().to_owned(),
            })
    }

    /// Reads an output by socket name.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let port = self.definition.ports().find_output(name)?;
        self.values.get(&port)
    }

    /// Written outputs as `(socket name, value)` in port order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let ports = self.definition.ports();
        self.values
            .iter()
            .filter_map(move |(port, value)| ports.get(*port).map(|s| (s.name(), value)))
    }

    /// Number of outputs written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the node wrote nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn socket_name(&self, port: PortId) -> String {
        self.definition
            .ports()
            .get(port)
            .map(|s| s.name().to_owned())
            .unwrap_or_default()
    }
}

impl<E> std::fmt::Debug for Outputs<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outputs")
            .field("node", &self.node)
            .field("values", &self.values)
            .finish()
    }
}
