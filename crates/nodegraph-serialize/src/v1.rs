//! Version 1 of the stream layout.
//!
//! ```text
//! i32 instance count
//! per instance:
//!     utf   node id
//!     bool  has editor data
//!     [utf name, i32 x, i32 y, i32 width, i32 height, bool expanded]
//!     i32   node parameter count (reserved, always 0)
//!     i32   override count
//!     per override: utf socket name, value
//! i32 connection count
//! per connection: i32 source index, utf source socket, i32 destination index, utf destination socket
//! ```
//!
//! Instance indices are positions in the instance list, in ID order.

use std::collections::HashMap;
use std::io::{Read, Write};

use nodegraph_core::{Direction, EditorData, NodeGraph, NodeId, NodeInstance, PortId};
use nodegraph_registry::NodeLookup;

use crate::DecodedGraph;
use crate::data::{DataRead, DataWrite};
use crate::error::SerializeError;
use crate::values::ValueSerializers;

pub(crate) const VERSION: i32 = 1;

pub(crate) fn write<E: 'static>(
    graph: &NodeGraph<E>,
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
    out: &mut dyn Write,
) -> Result<(), SerializeError> {
    let mut indices: HashMap<NodeId, i32> = HashMap::with_capacity(graph.instance_count());
    out.write_len(graph.instance_count())?;

    for (id, instance) in graph.instances() {
        let definition = instance.definition();
        let node_id = nodes
            .id_of_definition(definition)
            .ok_or_else(|| SerializeError::UnregisteredDefinition(definition.label().to_owned()))?;
        out.write_utf(node_id)?;

        match instance.editor() {
            Some(editor) => {
                out.write_bool(true)?;
                out.write_utf(&editor.display_name)?;
                out.write_i32(editor.x)?;
                out.write_i32(editor.y)?;
                out.write_i32(editor.width)?;
                out.write_i32(editor.height)?;
                out.write_bool(editor.expanded)?;
            }
            None => out.write_bool(false)?,
        }

        out.write_len(0)?;
        let overrides: Vec<(PortId, _)> = instance.changed_overrides().collect();
        out.write_len(overrides.len())?;
        for (port, value) in overrides {
            out.write_utf(definition.ports()[port].name())?;
            values.write_value(value, out)?;
        }

        indices.insert(id, indices.len() as i32);
    }

    out.write_len(graph.connection_count())?;
    for connection in graph.connections() {
        let (src, dst) = (connection.source, connection.destination);
        out.write_i32(indices[&src.node])?;
        out.write_utf(socket_name(graph, src.node, src.port))?;
        out.write_i32(indices[&dst.node])?;
        out.write_utf(socket_name(graph, dst.node, dst.port))?;
    }
    Ok(())
}

pub(crate) fn read<E: 'static>(
    nodes: &dyn NodeLookup<E>,
    values: &ValueSerializers,
    input: &mut dyn Read,
) -> Result<DecodedGraph<E>, SerializeError> {
    let mut graph = NodeGraph::new();
    let count = input.read_len()?;
    let mut ids = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let node_id = input.read_utf()?;
        let definition = nodes
            .definition(&node_id)
            .ok_or_else(|| SerializeError::UnknownNode(node_id.clone()))?;
        let mut instance = NodeInstance::new(definition.clone());

        if input.read_bool()? {
            instance.set_editor(EditorData {
                display_name: input.read_utf()?,
                x: input.read_i32()?,
                y: input.read_i32()?,
                width: input.read_i32()?,
                height: input.read_i32()?,
                expanded: input.read_bool()?,
            });
        }

        let parameters = input.read_len()?;
        if parameters != 0 {
            return Err(SerializeError::UnexpectedParameters(parameters));
        }

        let overrides = input.read_len()?;
        for _ in 0..overrides {
            let socket = input.read_utf()?;
            let port = definition
                .ports()
                .find_input(&socket)
                .ok_or_else(|| SerializeError::UnknownSocket {
                    socket: socket.clone(),
                    node: node_id.clone(),
                })?;
            let value = values.read_value(definition.ports()[port].value_type(), input)?;
            instance.set_override_value(port, value)?;
        }

        ids.push(graph.add_instance(instance));
    }

    let connections = input.read_len()?;
    for _ in 0..connections {
        let from = resolve(&graph, &ids, nodes, input, Direction::Output)?;
        let to = resolve(&graph, &ids, nodes, input, Direction::Input)?;
        if !graph.connect(from, to)? {
            let index = ids.iter().position(|id| *id == to.node).unwrap_or_default();
            let occupied = format!(
                "{}.{}",
                crate::instance_key(index),
                socket_name(&graph, to.node, to.port)
            );
            tracing::debug!("read_graph: second source for {occupied}");
            return Err(SerializeError::InputOccupied(occupied));
        }
    }

    Ok(DecodedGraph { graph, ids })
}

/// Reads an `(index, socket name)` pair and resolves it to an endpoint.
fn resolve<E: 'static>(
    graph: &NodeGraph<E>,
    ids: &[NodeId],
    nodes: &dyn NodeLookup<E>,
    input: &mut dyn Read,
    direction: Direction,
) -> Result<nodegraph_core::Endpoint, SerializeError> {
    let index = input.read_i32()?;
    let node = usize::try_from(index)
        .ok()
        .and_then(|i| ids.get(i).copied())
        .ok_or(SerializeError::InstanceOutOfRange {
            index,
            count: ids.len(),
        })?;
    let socket = input.read_utf()?;
    let definition = graph
        .instance(node)
        .map(|inst| inst.definition())
        .ok_or(SerializeError::InstanceOutOfRange {
            index,
            count: ids.len(),
        })?;
    let port = definition
        .ports()
        .find(direction, &socket)
        .ok_or_else(|| SerializeError::UnknownSocket {
            node: nodes
                .id_of_definition(definition)
                .unwrap_or(definition.label())
                .to_owned(),
            socket,
        })?;
    Ok(node.at(port))
}

fn socket_name<E: 'static>(graph: &NodeGraph<E>, node: NodeId, port: PortId) -> &str {
    graph
        .instance(node)
        .and_then(|inst| inst.definition().ports().get(port))
        .map_or("", |s| s.name())
}
