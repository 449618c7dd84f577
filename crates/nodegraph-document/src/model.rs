//! Serde model of a graph document.

use std::collections::BTreeMap;
use std::path::Path;

use nodegraph_core::EditorData;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Key of the instance at position `index` in ID order.
pub fn instance_key(index: usize) -> String {
    format!("instance{index:04}")
}

/// A whole graph.
///
/// # JSON Format
///
/// ```json
/// {
///   "instances": {
///     "instance0000": { "type": "constant", "initialValues": { "value": 3.0 } },
///     "instance0001": {
///       "type": "add",
///       "editor": { "displayName": "sum", "x": 40, "y": 0 }
///     }
///   },
///   "connections": [
///     {
///       "from": { "node": "instance0000", "socket": "out" },
///       "to": { "node": "instance0001", "socket": "a" }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Instances by key.
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceDocument>,

    /// Connections, each feeding one input.
    #[serde(default)]
    pub connections: Vec<ConnectionDocument>,
}

impl GraphDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the document as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| DocumentError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Save the document as a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = self.to_json_pretty()?;
        std::fs::write(path, content).map_err(|e| DocumentError::write_file(path, e))
    }
}

/// One node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDocument {
    /// Registry identifier of the node definition.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Editor presentation data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorDocument>,

    /// Input overrides by socket name. Only values that differ from the
    /// socket default are written.
    #[serde(
        default,
        rename = "initialValues",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub initial_values: BTreeMap<String, serde_json::Value>,
}

impl InstanceDocument {
    /// Creates an instance entry with no editor data and no overrides.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            editor: None,
            initial_values: BTreeMap::new(),
        }
    }
}

/// Editor presentation data of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDocument {
    /// Name shown in the editor.
    pub display_name: String,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Widget width.
    #[serde(default)]
    pub width: i32,
    /// Widget height.
    #[serde(default)]
    pub height: i32,
    /// Whether the widget is expanded (defaults to `true`).
    #[serde(default = "default_expanded")]
    pub expanded: bool,
}

fn default_expanded() -> bool {
    true
}

impl From<&EditorData> for EditorDocument {
    fn from(editor: &EditorData) -> Self {
        Self {
            display_name: editor.display_name.clone(),
            x: editor.x,
            y: editor.y,
            width: editor.width,
            height: editor.height,
            expanded: editor.expanded,
        }
    }
}

impl From<&EditorDocument> for EditorData {
    fn from(editor: &EditorDocument) -> Self {
        EditorData::new(editor.display_name.clone(), editor.x, editor.y)
            .with_size(editor.width, editor.height)
            .with_expanded(editor.expanded)
    }
}

/// A connection between an output and an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDocument {
    /// Source output.
    pub from: SocketRefDocument,
    /// Destination input.
    pub to: SocketRefDocument,
}

/// A socket on an instance, by instance key and socket name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketRefDocument {
    /// Instance key.
    pub node: String,
    /// Socket name.
    pub socket: String,
}

impl SocketRefDocument {
    /// Creates a reference to `socket` on instance `node`.
    pub fn new(node: impl Into<String>, socket: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            socket: socket.into(),
        }
    }
}

impl std::fmt::Display for SocketRefDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}
