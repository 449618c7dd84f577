//! Node graph: instances plus the connections between their sockets.
//!
//! Instances live in an arena addressed by [`NodeId`]. Connections are stored
//! as a destination → source map keyed by [`Endpoint`], which makes the
//! "one source per input" rule structural: connecting an input that is
//! already fed leaves the existing edge alone and reports `false`.
//!
//! The graph is pure topology; [`new_evaluation_round`](NodeGraph::new_evaluation_round)
//! borrows it immutably to compute values.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::btree_map::Entry;
use std::fmt;

use crate::error::GraphError;
use crate::instance::NodeInstance;
use crate::round::{EvalOptions, EvaluationRound};
use crate::socket::{Direction, InputSocket, OutputSocket, PortId, Socket};
use crate::value::SocketValue;

/// Identifier of an instance within one graph.
///
/// IDs are assigned sequentially and never reused within a graph, so an ID
/// held after its instance was removed cannot silently refer to another one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Sentinel used in errors raised by instances that are not addressed through a graph.
    #[inline]
    pub fn sentinel() -> Self {
        Self(u32::MAX)
    }

    /// ID of the arena slot at `index`. The sentinel value is never assigned.
    pub(crate) fn for_slot(index: usize) -> Result<Self, GraphError> {
        match u32::try_from(index) {
            Ok(raw) if raw != u32::MAX => Ok(Self(raw)),
            _ => Err(GraphError::CapacityExceeded),
        }
    }

    /// Endpoint at one of this node's sockets.
    #[inline]
    pub fn at(self, port: impl Into<PortId>) -> Endpoint {
        Endpoint::new(self, port)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A socket of a particular instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    /// Instance.
    pub node: NodeId,
    /// Socket within the instance's definition.
    pub port: PortId,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(node: NodeId, port: impl Into<PortId>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node.0, self.port.0)
    }
}

/// One edge, from an output to an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Output endpoint.
    pub source: Endpoint,
    /// Input endpoint.
    pub destination: Endpoint,
}

/// Instances and the connections between them.
///
/// `E` is the environment type handed to evaluation rounds.
pub struct NodeGraph<E> {
    instances: Vec<Option<NodeInstance<E>>>,
    /// Destination → source.
    connections: BTreeMap<Endpoint, Endpoint>,
    live: usize,
}

impl<E: 'static> Default for NodeGraph<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> NodeGraph<E> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            connections: BTreeMap::new(),
            live: 0,
        }
    }

    // --- Instances ---

    /// Adds an instance and returns its ID.
    ///
    /// # Panics
    ///
    /// Panics if the graph has already handed out every available ID. Use
    /// [`try_add_instance`](Self::try_add_instance) to get an error instead.
    pub fn add_instance(&mut self, instance: NodeInstance<E>) -> NodeId {
        match self.try_add_instance(instance) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Adds an instance, failing with [`GraphError::CapacityExceeded`] once
    /// every ID below the sentinel has been assigned.
    pub fn try_add_instance(&mut self, instance: NodeInstance<E>) -> Result<NodeId, GraphError> {
        let id = NodeId::for_slot(self.instances.len())?;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} as {id}", instance.definition().label());
        self.instances.push(Some(instance));
        self.live += 1;
        Ok(id)
    }

    /// Removes an instance together with every connection touching it.
    ///
    /// Returns `None` if the ID is unknown.
    pub fn remove_instance(&mut self, id: NodeId) -> Option<NodeInstance<E>> {
        let instance = self.instances.get_mut(id.0 as usize)?.take()?;
        self.live -= 1;
        self.connections
            .retain(|dst, src| dst.node != id && src.node != id);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: {id}");
        Some(instance)
    }

    /// Returns the instance with this ID.
    pub fn instance(&self, id: NodeId) -> Option<&NodeInstance<E>> {
        self.instances.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Returns the instance with this ID for editing overrides or editor data.
    pub fn instance_mut(&mut self, id: NodeId) -> Option<&mut NodeInstance<E>> {
        self.instances.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Returns `true` if the ID refers to a live instance.
    pub fn contains(&self, id: NodeId) -> bool {
        self.instance(id).is_some()
    }

    /// Live instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = (NodeId, &NodeInstance<E>)> {
        self.instances
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|inst| (NodeId(i as u32), inst)))
    }

    /// Number of live instances.
    pub fn instance_count(&self) -> usize {
        self.live
    }

    // --- Connections ---

    /// Connects an output to an input.
    ///
    /// Returns `Ok(false)` and keeps the existing edge if the input already
    /// has a source. Both endpoints must exist, have the right directions and
    /// carry the same value type.
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<bool, GraphError> {
        let source = self.socket(from, Direction::Output)?;
        let destination = self.socket(to, Direction::Input)?;
        if source.value_type() != destination.value_type() {
            return Err(GraphError::TypeMismatch {
                socket: destination.name().to_owned(),
                expected: destination.value_type(),
                found: source.value_type(),
            });
        }

        match self.connections.entry(to) {
            Entry::Occupied(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("graph_connect: {to} already fed, ignoring {from}");
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(from);
                #[cfg(feature = "tracing")]
                tracing::debug!("graph_connect: {from} → {to}");
                Ok(true)
            }
        }
    }

    /// Connects sockets whose value types agree at compile time.
    pub fn connect_sockets<V: SocketValue>(
        &mut self,
        from: NodeId,
        output: OutputSocket<V>,
        to: NodeId,
        input: InputSocket<V>,
    ) -> Result<bool, GraphError> {
        self.connect(from.at(output), to.at(input))
    }

    /// Removes the edge `from → to` if exactly that edge exists.
    pub fn disconnect(&mut self, from: Endpoint, to: Endpoint) -> Result<bool, GraphError> {
        self.socket(from, Direction::Output)?;
        self.socket(to, Direction::Input)?;
        if self.connections.get(&to) == Some(&from) {
            self.connections.remove(&to);
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_disconnect: {from} → {to}");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Removes whatever edge feeds `to`.
    pub fn disconnect_from_source(&mut self, to: Endpoint) -> Result<bool, GraphError> {
        self.socket(to, Direction::Input)?;
        Ok(self.connections.remove(&to).is_some())
    }

    /// Removes every edge leaving `from` and returns how many were removed.
    pub fn disconnect_from_destinations(&mut self, from: Endpoint) -> Result<usize, GraphError> {
        self.socket(from, Direction::Output)?;
        let before = self.connections.len();
        self.connections.retain(|_, src| *src != from);
        Ok(before - self.connections.len())
    }

    /// Source feeding an input, if connected.
    pub fn source_of(&self, to: Endpoint) -> Option<Endpoint> {
        self.connections.get(&to).copied()
    }

    /// Inputs fed by an output.
    pub fn destinations_of(&self, from: Endpoint) -> impl Iterator<Item = Endpoint> + '_ {
        self.connections
            .iter()
            .filter(move |(_, src)| **src == from)
            .map(|(dst, _)| *dst)
    }

    /// All edges, ordered by destination.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.connections.iter().map(|(dst, src)| Connection {
            source: *src,
            destination: *dst,
        })
    }

    /// Visits every edge as `(source, destination)`.
    pub fn for_each_connection(&self, mut visit: impl FnMut(Endpoint, Endpoint)) {
        for (dst, src) in &self.connections {
            visit(*src, *dst);
        }
    }

    /// Number of edges.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // --- Evaluation ---

    /// Starts an evaluation round with default options.
    pub fn new_evaluation_round(&self, environment: E) -> EvaluationRound<'_, E> {
        EvaluationRound::new(self, environment, EvalOptions::default())
    }

    /// Starts an evaluation round with explicit options.
    pub fn new_evaluation_round_with(
        &self,
        environment: E,
        options: EvalOptions,
    ) -> EvaluationRound<'_, E> {
        EvaluationRound::new(self, environment, options)
    }

    // --- Copying ---

    /// Independent copy with the same topology.
    pub fn copy(&self) -> Self {
        self.copy_with_mapping().0
    }

    /// Independent copy plus the old → new ID mapping.
    ///
    /// Every instance is copied and every connection is re-created between the
    /// copies. Copied IDs are dense, so they may differ from the originals when
    /// instances were removed.
    pub fn copy_with_mapping(&self) -> (Self, HashMap<NodeId, NodeId>) {
        let mut copy = Self::new();
        let mut mapping = HashMap::with_capacity(self.live);
        for (id, instance) in self.instances() {
            mapping.insert(id, copy.add_instance(instance.copy()));
        }
        for (dst, src) in &self.connections {
            let remap = |e: &Endpoint| Endpoint {
                node: mapping[&e.node],
                port: e.port,
            };
            copy.connections.insert(remap(dst), remap(src));
        }
        (copy, mapping)
    }

    // --- Internal helpers ---

    fn socket(&self, endpoint: Endpoint, expected: Direction) -> Result<&Socket, GraphError> {
        let instance = self
            .instance(endpoint.node)
            .ok_or(GraphError::NodeNotFound(endpoint.node))?;
        let socket = instance
            .definition()
            .ports()
            .get(endpoint.port)
            .ok_or(GraphError::PortNotFound {
                node: endpoint.node,
                port: endpoint.port,
            })?;
        if socket.direction() != expected {
            return Err(GraphError::WrongDirection {
                node: endpoint.node,
                socket: socket.name().to_owned(),
                expected,
            });
        }
        Ok(socket)
    }
}

impl<E: 'static> Clone for NodeGraph<E> {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<E> fmt::Debug for NodeGraph<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGraph")
            .field("instances", &self.live)
            .field("connections", &self.connections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::node::{Definition, NodeDefinition, ProcessContext};
    use crate::socket::PortList;

    struct Pass {
        ports: PortList,
        input: InputSocket<f64>,
        output: OutputSocket<f64>,
        label: InputSocket<String>,
    }

    impl Pass {
        fn definition() -> Definition<()> {
            let mut ports = PortList::builder();
            let input = ports.input("in", 0.0);
            let label = ports.input("label", String::new());
            let output = ports.output("out");
            Definition::new(Self {
                ports: ports.build(),
                input,
                output,
                label,
            })
        }
    }

    impl NodeDefinition<()> for Pass {
        type State = ();

        fn ports(&self) -> &PortList {
            &self.ports
        }

        fn init_state(&self) {}

        fn process(&self, ctx: &mut ProcessContext<'_, (), ()>) -> Result<(), EvalError> {
            let v = ctx.get(self.input)?;
            ctx.set(self.output, v)
        }
    }

    fn handles(def: &Definition<()>) -> (InputSocket<f64>, OutputSocket<f64>, InputSocket<String>) {
        let pass = def.downcast_ref::<Pass>().unwrap();
        (pass.input, pass.output, pass.label)
    }

    fn graph_with(n: usize) -> (NodeGraph<()>, Vec<NodeId>, Definition<()>) {
        let def = Pass::definition();
        let mut graph = NodeGraph::new();
        let ids = (0..n)
            .map(|_| graph.add_instance(NodeInstance::new(def.clone())))
            .collect();
        (graph, ids, def)
    }

    // --- Instance tests ---

    #[test]
    fn test_ids_stop_before_sentinel() {
        assert_eq!(NodeId::for_slot(7), Ok(NodeId(7)));
        assert_eq!(NodeId::for_slot(u32::MAX as usize - 1), Ok(NodeId(u32::MAX - 1)));
        assert_eq!(
            NodeId::for_slot(u32::MAX as usize),
            Err(GraphError::CapacityExceeded)
        );
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            NodeId::for_slot(u32::MAX as usize + 1),
            Err(GraphError::CapacityExceeded)
        );
    }

    #[test]
    fn test_try_add_instance() {
        let (mut graph, ids, def) = graph_with(1);
        let id = graph.try_add_instance(NodeInstance::new(def)).unwrap();
        assert_eq!(id, NodeId(ids[0].0 + 1));
        assert_eq!(graph.instance_count(), 2);
    }

    #[test]
    fn test_add_instances() {
        let (graph, ids, _) = graph_with(3);
        assert_eq!(graph.instance_count(), 3);
        assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert!(graph.contains(NodeId(2)));
    }

    #[test]
    fn test_ids_never_reused() {
        let (mut graph, ids, def) = graph_with(2);
        graph.remove_instance(ids[1]);
        let next = graph.add_instance(NodeInstance::new(def));
        assert_eq!(next, NodeId(2));
        assert!(!graph.contains(ids[1]));
    }

    #[test]
    fn test_remove_nonexistent_instance() {
        let (mut graph, ids, _) = graph_with(1);
        assert!(graph.remove_instance(NodeId(7)).is_none());
        assert!(graph.remove_instance(ids[0]).is_some());
        assert!(graph.remove_instance(ids[0]).is_none());
        assert_eq!(graph.instance_count(), 0);
    }

    #[test]
    fn test_remove_cascades_connections() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        graph.connect(ids[0].at(output), ids[1].at(input)).unwrap();
        graph.connect(ids[1].at(output), ids[2].at(input)).unwrap();
        assert_eq!(graph.connection_count(), 2);

        graph.remove_instance(ids[1]);
        assert_eq!(graph.connection_count(), 0);
    }

    // --- Connection tests ---

    #[test]
    fn test_connect_and_query() {
        let (mut graph, ids, def) = graph_with(2);
        let (input, output, _) = handles(&def);
        assert_eq!(graph.connect(ids[0].at(output), ids[1].at(input)), Ok(true));
        assert_eq!(graph.source_of(ids[1].at(input)), Some(ids[0].at(output)));
        assert_eq!(
            graph.destinations_of(ids[0].at(output)).collect::<Vec<_>>(),
            vec![ids[1].at(input)]
        );
    }

    #[test]
    fn test_connect_occupied_destination_keeps_existing() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        assert_eq!(graph.connect(ids[0].at(output), ids[2].at(input)), Ok(true));
        assert_eq!(graph.connect(ids[1].at(output), ids[2].at(input)), Ok(false));
        assert_eq!(graph.source_of(ids[2].at(input)), Some(ids[0].at(output)));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_fan_out_allowed() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        assert_eq!(graph.connect(ids[0].at(output), ids[1].at(input)), Ok(true));
        assert_eq!(graph.connect(ids[0].at(output), ids[2].at(input)), Ok(true));
        assert_eq!(graph.destinations_of(ids[0].at(output)).count(), 2);
    }

    #[test]
    fn test_connect_wrong_direction_rejected() {
        let (mut graph, ids, def) = graph_with(2);
        let (input, output, _) = handles(&def);
        let result = graph.connect(ids[0].at(input), ids[1].at(input));
        assert!(matches!(
            result,
            Err(GraphError::WrongDirection {
                expected: Direction::Output,
                ..
            })
        ));
        let result = graph.connect(ids[0].at(output), ids[1].at(output));
        assert!(matches!(
            result,
            Err(GraphError::WrongDirection {
                expected: Direction::Input,
                ..
            })
        ));
    }

    #[test]
    fn test_connect_type_mismatch_rejected() {
        let (mut graph, ids, def) = graph_with(2);
        let (_, output, label) = handles(&def);
        let result = graph.connect(ids[0].at(output), ids[1].at(label));
        assert!(matches!(result, Err(GraphError::TypeMismatch { .. })));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_connect_unknown_node_or_port() {
        let (mut graph, ids, def) = graph_with(1);
        let (input, output, _) = handles(&def);
        let result = graph.connect(NodeId(9).at(output), ids[0].at(input));
        assert_eq!(result, Err(GraphError::NodeNotFound(NodeId(9))));
        let result = graph.connect(ids[0].at(output), Endpoint::new(ids[0], PortId(42)));
        assert!(matches!(result, Err(GraphError::PortNotFound { .. })));
    }

    #[test]
    fn test_disconnect_exact_match_only() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        graph.connect(ids[0].at(output), ids[2].at(input)).unwrap();

        assert_eq!(graph.disconnect(ids[1].at(output), ids[2].at(input)), Ok(false));
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.disconnect(ids[0].at(output), ids[2].at(input)), Ok(true));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_disconnect_from_source() {
        let (mut graph, ids, def) = graph_with(2);
        let (input, output, _) = handles(&def);
        assert_eq!(graph.disconnect_from_source(ids[1].at(input)), Ok(false));
        graph.connect(ids[0].at(output), ids[1].at(input)).unwrap();
        assert_eq!(graph.disconnect_from_source(ids[1].at(input)), Ok(true));
        assert!(graph.source_of(ids[1].at(input)).is_none());
    }

    #[test]
    fn test_reconnect_after_disconnect_from_source() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        let (x, y, z) = (ids[0], ids[1], ids[2]);
        graph.instance_mut(x).unwrap().set_override(input, 2.0).unwrap();
        graph.instance_mut(y).unwrap().set_override(input, 5.0).unwrap();

        assert_eq!(graph.connect(x.at(output), z.at(input)), Ok(true));
        assert_eq!(graph.connect(y.at(output), z.at(input)), Ok(false));
        assert_eq!(graph.source_of(z.at(input)), Some(x.at(output)));

        assert_eq!(graph.disconnect_from_source(z.at(input)), Ok(true));
        assert_eq!(graph.connect(y.at(output), z.at(input)), Ok(true));
        assert_eq!(graph.source_of(z.at(input)), Some(y.at(output)));
        assert_eq!(graph.connection_count(), 1);

        let mut round = graph.new_evaluation_round(());
        assert_eq!(round.eval(z).unwrap().get(output), Ok(5.0));
    }

    #[test]
    fn test_disconnect_from_destinations_counts() {
        let (mut graph, ids, def) = graph_with(4);
        let (input, output, _) = handles(&def);
        for &dst in &ids[1..] {
            graph.connect(ids[0].at(output), dst.at(input)).unwrap();
        }
        assert_eq!(graph.disconnect_from_destinations(ids[0].at(output)), Ok(3));
        assert_eq!(graph.disconnect_from_destinations(ids[0].at(output)), Ok(0));
    }

    #[test]
    fn test_for_each_connection_visits_source_then_destination() {
        let (mut graph, ids, def) = graph_with(2);
        let (input, output, _) = handles(&def);
        graph.connect(ids[0].at(output), ids[1].at(input)).unwrap();
        let mut seen = Vec::new();
        graph.for_each_connection(|src, dst| seen.push((src, dst)));
        assert_eq!(seen, vec![(ids[0].at(output), ids[1].at(input))]);
    }

    // --- Copy tests ---

    #[test]
    fn test_copy_remaps_connections() {
        let (mut graph, ids, def) = graph_with(3);
        let (input, output, _) = handles(&def);
        graph.connect(ids[0].at(output), ids[2].at(input)).unwrap();
        graph.remove_instance(ids[1]);

        let (copy, mapping) = graph.copy_with_mapping();
        assert_eq!(copy.instance_count(), 2);
        assert_eq!(mapping[&ids[2]], NodeId(1));
        let edges: Vec<Connection> = copy.connections().collect();
        assert_eq!(
            edges,
            vec![Connection {
                source: NodeId(0).at(output),
                destination: NodeId(1).at(input),
            }]
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let (mut graph, ids, def) = graph_with(2);
        let (input, output, _) = handles(&def);
        graph.connect(ids[0].at(output), ids[1].at(input)).unwrap();

        let mut copy = graph.clone();
        copy.disconnect_from_source(ids[1].at(input)).unwrap();
        copy.instance_mut(ids[0])
            .unwrap()
            .set_override(input, 3.0)
            .unwrap();

        assert_eq!(graph.connection_count(), 1);
        assert!(graph.instance(ids[0]).unwrap().stored_override(input.port()).is_none());
    }
}
