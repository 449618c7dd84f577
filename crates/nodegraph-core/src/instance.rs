//! Node instances: a definition placed in a graph, with its own input overrides.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::error::GraphError;
use crate::graph::NodeId;
use crate::node::Definition;
use crate::socket::{Direction, InputSocket, PortId, Socket};
use crate::value::{SocketValue, Value};

/// Editor-facing presentation data. Never consulted by evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorData {
    /// Name shown in the editor.
    pub display_name: String,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Width of the node widget.
    pub width: i32,
    /// Height of the node widget.
    pub height: i32,
    /// Whether the node widget is expanded.
    pub expanded: bool,
}

impl EditorData {
    /// Creates editor data at a position with zero size, expanded.
    pub fn new(display_name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            display_name: display_name.into(),
            x,
            y,
            width: 0,
            height: 0,
            expanded: true,
        }
    }

    /// Sets the widget size.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets whether the widget is expanded.
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

/// One placement of a node definition inside a graph.
///
/// Overrides replace an input's default when the input is not connected.
/// `Clone` produces an independent copy: overrides and editor data are
/// duplicated, the definition is shared.
pub struct NodeInstance<E> {
    definition: Definition<E>,
    editor: Option<EditorData>,
    overrides: BTreeMap<PortId, Value>,
}

impl<E: 'static> NodeInstance<E> {
    /// Creates an instance with no overrides and no editor data.
    pub fn new(definition: Definition<E>) -> Self {
        Self {
            definition,
            editor: None,
            overrides: BTreeMap::new(),
        }
    }

    /// Builder form of [`set_editor`](Self::set_editor).
    pub fn with_editor(mut self, editor: EditorData) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Builder form of [`set_override`](Self::set_override).
    pub fn with_override<V: SocketValue>(
        mut self,
        socket: InputSocket<V>,
        value: V,
    ) -> Result<Self, GraphError> {
        self.set_override(socket, value)?;
        Ok(self)
    }

    /// Definition this instance was created from.
    pub fn definition(&self) -> &Definition<E> {
        &self.definition
    }

    /// Editor data, if any.
    pub fn editor(&self) -> Option<&EditorData> {
        self.editor.as_ref()
    }

    /// Mutable editor data, if any.
    pub fn editor_mut(&mut self) -> Option<&mut EditorData> {
        self.editor.as_mut()
    }

    /// Replaces the editor data.
    pub fn set_editor(&mut self, editor: EditorData) {
        self.editor = Some(editor);
    }

    /// Removes the editor data.
    pub fn clear_editor(&mut self) -> Option<EditorData> {
        self.editor.take()
    }

    /// Sets a typed override.
    pub fn set_override<V: SocketValue>(
        &mut self,
        socket: InputSocket<V>,
        value: V,
    ) -> Result<(), GraphError> {
        self.set_override_value(socket.port(), Value::new(value))
    }

    /// Sets an override by port. The value must match the input's type.
    pub fn set_override_value(&mut self, port: PortId, value: Value) -> Result<(), GraphError> {
        let socket = self.input_socket(port)?;
        if socket.value_type() != value.value_type() {
            return Err(GraphError::TypeMismatch {
                socket: socket.name().to_owned(),
                expected: socket.value_type(),
                found: value.value_type(),
            });
        }
        self.overrides.insert(port, value);
        Ok(())
    }

    /// Returns the override of an input, memoizing the default if none is set.
    ///
    /// Inputs declared through [`PortListBuilder::input`](crate::PortListBuilder::input)
    /// always carry a default, so [`GraphError::MissingDefault`] only surfaces
    /// for sockets built some other way.
    pub fn override_value(&mut self, port: PortId) -> Result<Value, GraphError> {
        let socket = self.input_socket(port)?;
        let default = socket.default_value().cloned();
        let name = socket.name().to_owned();
        match self.overrides.entry(port) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let default = default.ok_or(GraphError::MissingDefault { socket: name })?;
                Ok(entry.insert(default).clone())
            }
        }
    }

    /// Typed form of [`override_value`](Self::override_value).
    pub fn override_of<V: SocketValue + Clone>(
        &mut self,
        socket: InputSocket<V>,
    ) -> Result<V, GraphError> {
        let value = self.override_value(socket.port())?;
        let found = value.value_type();
        value.get::<V>().ok_or_else(|| GraphError::TypeMismatch {
            socket: self.definition.ports()[socket.port()].name().to_owned(),
            expected: crate::value::ValueType::of::<V>(),
            found,
        })
    }

    /// Value an unconnected input resolves to: the override, else the default.
    ///
    /// Unlike [`override_value`](Self::override_value) this does not record anything.
    pub fn effective_value(&self, port: PortId) -> Option<Value> {
        self.overrides.get(&port).cloned().or_else(|| {
            self.definition
                .ports()
                .get(port)
                .and_then(|s| s.default_value().cloned())
        })
    }

    /// Explicitly stored override of an input, without falling back to the default.
    pub fn stored_override(&self, port: PortId) -> Option<&Value> {
        self.overrides.get(&port)
    }

    /// Removes an override, returning it.
    pub fn clear_override(&mut self, port: PortId) -> Option<Value> {
        self.overrides.remove(&port)
    }

    /// Stored overrides in port order.
    pub fn overrides(&self) -> impl Iterator<Item = (PortId, &Value)> {
        self.overrides.iter().map(|(port, value)| (*port, value))
    }

    /// Inputs whose resolved value differs from the declared default.
    ///
    /// This is what codecs persist.
    pub fn changed_overrides(&self) -> impl Iterator<Item = (PortId, &Value)> {
        self.overrides().filter(|(port, value)| {
            self.definition
                .ports()
                .get(*port)
                .and_then(Socket::default_value)
                .is_none_or(|default| default != *value)
        })
    }

    /// Independent copy of this instance.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    fn input_socket(&self, port: PortId) -> Result<&Socket, GraphError> {
        let socket = self
            .definition
            .ports()
            .get(port)
            .ok_or(GraphError::PortNotFound {
                node: NodeId::sentinel(),
                port,
            })?;
        if socket.direction() != Direction::Input {
            return Err(GraphError::WrongDirection {
                node: NodeId::sentinel(),
                socket: socket.name().to_owned(),
                expected: Direction::Input,
            });
        }
        Ok(socket)
    }
}

impl<E> Clone for NodeInstance<E> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            editor: self.editor.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

impl<E> std::fmt::Debug for NodeInstance<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInstance")
            .field("definition", &self.definition)
            .field("editor", &self.editor)
            .field("overrides", &self.overrides)
            .finish()
    }
}
