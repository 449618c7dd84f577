//! Conversion between graphs and documents.

use std::collections::{BTreeMap, HashMap};

use nodegraph_core::{
    Definition, Direction, EditorData, Endpoint, NodeGraph, NodeId, NodeInstance, PortId,
};
use nodegraph_registry::NodeLookup;

use crate::error::{DecodeFailure, DocumentError};
use crate::model::{
    ConnectionDocument, EditorDocument, GraphDocument, InstanceDocument, SocketRefDocument,
    instance_key,
};
use crate::values::ValueCodecs;

/// A graph rebuilt from a document.
#[derive(Debug)]
pub struct DecodedDocument<E> {
    /// The rebuilt graph.
    pub graph: NodeGraph<E>,
    /// New ID of each instance, by document key.
    pub ids: BTreeMap<String, NodeId>,
}

impl<E> DecodedDocument<E> {
    /// ID of the instance stored under `key`.
    pub fn id(&self, key: &str) -> Option<NodeId> {
        self.ids.get(key).copied()
    }
}

/// Encodes one instance: its registry identifier, editor data and the
/// overrides that differ from their defaults.
pub fn encode_instance<E: 'static>(
    instance: &NodeInstance<E>,
    nodes: &dyn NodeLookup<E>,
    values: &ValueCodecs,
) -> Result<InstanceDocument, DocumentError> {
    let definition = instance.definition();
    let node_type = nodes
        .id_of_definition(definition)
        .ok_or_else(|| DocumentError::UnregisteredDefinition(definition.label().to_owned()))?;

    let mut document = InstanceDocument::new(node_type);
    document.editor = instance.editor().map(EditorDocument::from);
    for (port, value) in instance.changed_overrides() {
        let name = socket_name(definition, port);
        document
            .initial_values
            .insert(name.to_owned(), values.encode(name, value)?);
    }
    Ok(document)
}

/// Decodes one instance.
///
/// An unknown node type fails without a partial result. Bad overrides are
/// collected and the instance is returned as the partial result without them.
pub fn decode_instance<E: 'static>(
    document: &InstanceDocument,
    nodes: &dyn NodeLookup<E>,
    values: &ValueCodecs,
) -> Result<NodeInstance<E>, DecodeFailure<NodeInstance<E>>> {
    let Some(definition) = nodes.definition(&document.node_type) else {
        return Err(DecodeFailure::new(
            vec![DocumentError::UnknownType(document.node_type.clone())],
            None,
        ));
    };

    let mut instance = NodeInstance::new(definition.clone());
    if let Some(editor) = &document.editor {
        instance.set_editor(EditorData::from(editor));
    }

    let mut errors = Vec::new();
    for (socket, json) in &document.initial_values {
        let result = definition
            .ports()
            .find_input(socket)
            .ok_or_else(|| DocumentError::UnknownSocket {
                owner: document.node_type.clone(),
                socket: socket.clone(),
                direction: Direction::Input,
            })
            .and_then(|port| {
                let value = values.decode(socket, definition.ports()[port].value_type(), json)?;
                Ok(instance.set_override_value(port, value)?)
            });
        if let Err(e) = result {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(instance)
    } else {
        Err(DecodeFailure::new(errors, Some(instance)))
    }
}

/// Encodes a graph. Instances are keyed `instanceNNNN` in ID order.
pub fn encode_graph<E: 'static>(
    graph: &NodeGraph<E>,
    nodes: &dyn NodeLookup<E>,
    values: &ValueCodecs,
) -> Result<GraphDocument, DocumentError> {
    let mut document = GraphDocument::default();
    let mut keys: HashMap<NodeId, String> = HashMap::with_capacity(graph.instance_count());

    for (index, (id, instance)) in graph.instances().enumerate() {
        let key = instance_key(index);
        let entry = encode_instance(instance, nodes, values).map_err(|e| e.in_instance(&key))?;
        document.instances.insert(key.clone(), entry);
        keys.insert(id, key);
    }

    for connection in graph.connections() {
        document.connections.push(ConnectionDocument {
            from: socket_ref(graph, &keys, connection.source),
            to: socket_ref(graph, &keys, connection.destination),
        });
    }

    tracing::debug!(
        "document: encoded {} instances, {} connections",
        document.instances.len(),
        document.connections.len()
    );
    Ok(document)
}

/// Decodes a graph, collecting every problem instead of stopping at the first.
///
/// On failure the partial result holds every instance and connection that
/// could be rebuilt.
pub fn decode_graph<E: 'static>(
    document: &GraphDocument,
    nodes: &dyn NodeLookup<E>,
    values: &ValueCodecs,
) -> Result<DecodedDocument<E>, DecodeFailure<DecodedDocument<E>>> {
    let mut graph = NodeGraph::new();
    let mut ids = BTreeMap::new();
    let mut errors = Vec::new();

    for (key, entry) in &document.instances {
        let instance = match decode_instance(entry, nodes, values) {
            Ok(instance) => instance,
            Err(failure) => {
                errors.extend(failure.errors.into_iter().map(|e| e.in_instance(key)));
                match failure.partial {
                    Some(instance) => instance,
                    None => continue,
                }
            }
        };
        ids.insert(key.clone(), graph.add_instance(instance));
    }

    for connection in &document.connections {
        if let Err(e) = connect(&mut graph, &ids, connection) {
            errors.push(e);
        }
    }

    tracing::debug!(
        "document: decoded {} instances, {} connections, {} errors",
        graph.instance_count(),
        graph.connection_count(),
        errors.len()
    );

    let decoded = DecodedDocument { graph, ids };
    if errors.is_empty() {
        Ok(decoded)
    } else {
        Err(DecodeFailure::new(errors, Some(decoded)))
    }
}

fn connect<E: 'static>(
    graph: &mut NodeGraph<E>,
    ids: &BTreeMap<String, NodeId>,
    connection: &ConnectionDocument,
) -> Result<(), DocumentError> {
    let from = endpoint(graph, ids, &connection.from, Direction::Output)?;
    let to = endpoint(graph, ids, &connection.to, Direction::Input)?;
    match graph.connect(from, to) {
        Ok(true) => Ok(()),
        Ok(false) => Err(DocumentError::InputOccupied(connection.to.to_string())),
        Err(source) => Err(DocumentError::Connection {
            from: connection.from.to_string(),
            to: connection.to.to_string(),
            source,
        }),
    }
}

fn endpoint<E: 'static>(
    graph: &NodeGraph<E>,
    ids: &BTreeMap<String, NodeId>,
    reference: &SocketRefDocument,
    direction: Direction,
) -> Result<Endpoint, DocumentError> {
    let node = ids
        .get(&reference.node)
        .copied()
        .ok_or_else(|| DocumentError::UnknownInstance(reference.node.clone()))?;
    let port = graph
        .instance(node)
        .and_then(|instance| instance.definition().ports().find(direction, &reference.socket))
        .ok_or_else(|| DocumentError::UnknownSocket {
            owner: reference.node.clone(),
            socket: reference.socket.clone(),
            direction,
        })?;
    Ok(node.at(port))
}

fn socket_ref<E: 'static>(
    graph: &NodeGraph<E>,
    keys: &HashMap<NodeId, String>,
    endpoint: Endpoint,
) -> SocketRefDocument {
    let name = graph
        .instance(endpoint.node)
        .map_or("", |instance| socket_name(instance.definition(), endpoint.port));
    SocketRefDocument::new(
        keys.get(&endpoint.node).cloned().unwrap_or_default(),
        name,
    )
}

fn socket_name<E: 'static>(definition: &Definition<E>, port: PortId) -> &str {
    definition.ports().get(port).map_or("", |s| s.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodegraph_registry::{Add, NodeRegistry};
    use serde_json::json;

    #[test]
    fn test_encode_instance_skips_defaults() {
        let registry = NodeRegistry::<()>::with_builtins();
        let add = registry.get_as::<Add>("add").unwrap();
        let (a, b) = (add.a, add.b);
        let instance = registry
            .instantiate("add")
            .unwrap()
            .with_override(a, 0.0)
            .and_then(|i| i.with_override(b, 2.0))
            .unwrap();

        let document =
            encode_instance(&instance, &registry, &ValueCodecs::with_primitives()).unwrap();
        assert_eq!(document.node_type, "add");
        assert_eq!(document.initial_values.len(), 1);
        assert_eq!(document.initial_values["b"], json!(2.0));
    }

    #[test]
    fn test_decode_instance_unknown_type() {
        let registry = NodeRegistry::<()>::with_builtins();
        let failure = decode_instance::<()>(
            &InstanceDocument::new("teleport"),
            &registry,
            &ValueCodecs::with_primitives(),
        )
        .unwrap_err();
        assert!(failure.partial.is_none());
        assert_eq!(failure.to_string(), "unknown node type 'teleport'");
    }

    #[test]
    fn test_decode_instance_keeps_good_overrides() {
        let registry = NodeRegistry::<()>::with_builtins();
        let a = registry.get_as::<Add>("add").unwrap().a;
        let mut document = InstanceDocument::new("add");
        document.initial_values.insert("a".into(), json!(5));
        document.initial_values.insert("z".into(), json!(1));

        let failure =
            decode_instance::<()>(&document, &registry, &ValueCodecs::with_primitives()).unwrap_err();
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.to_string(), "no input socket 'z' on 'add'");
        let instance = failure.into_partial().unwrap();
        assert_eq!(instance.effective_value(a.port()).and_then(|v| v.get::<f64>()), Some(5.0));
    }

    #[test]
    fn test_output_socket_is_not_an_override_target() {
        let registry = NodeRegistry::<()>::with_builtins();
        let mut document = InstanceDocument::new("add");
        document.initial_values.insert("out".into(), json!(1.0));
        let failure =
            decode_instance::<()>(&document, &registry, &ValueCodecs::with_primitives()).unwrap_err();
        assert!(matches!(
            failure.errors[0],
            DocumentError::UnknownSocket { direction: Direction::Input, .. }
        ));
    }

    #[test]
    fn test_unregistered_definition() {
        let registry = NodeRegistry::<()>::with_builtins();
        let stray = NodeInstance::new(Definition::new(Add::new()));
        let err = encode_instance(&stray, &registry, &ValueCodecs::new()).unwrap_err();
        assert!(matches!(err, DocumentError::UnregisteredDefinition(ref label) if label == "add"));
    }
}
