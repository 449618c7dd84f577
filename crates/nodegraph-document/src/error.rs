//! Error types for the document format.

use std::fmt;
use std::path::PathBuf;

use nodegraph_core::{Direction, GraphError, ValueType};
use thiserror::Error;

/// A single problem found while encoding or decoding a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not a well-formed document.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A `type` field names a node the registry does not know.
    #[error("unknown node type '{0}'")]
    UnknownType(String),

    /// A definition in the graph has no identifier in the registry.
    #[error("missing id for node '{0}'")]
    UnregisteredDefinition(String),

    /// A connection names an instance key that is not in the document.
    #[error("no instance with id '{0}'")]
    UnknownInstance(String),

    /// A socket name does not exist on the node with that direction.
    #[error("no {direction} socket '{socket}' on '{owner}'")]
    UnknownSocket {
        /// Instance key or node type the socket was looked up on.
        owner: String,
        /// Socket name from the document.
        socket: String,
        /// Direction the socket was expected to have.
        direction: Direction,
    },

    /// No value codec is registered for a socket's type.
    #[error("no value codec registered for {value_type} (socket '{socket}')")]
    NoValueCodec {
        /// Socket whose value could not be converted.
        socket: String,
        /// Declared type of the socket.
        value_type: ValueType,
    },

    /// A stored value does not fit the socket's type.
    #[error("bad value for socket '{socket}': {source}")]
    BadValue {
        /// Socket the value belongs to.
        socket: String,
        /// Conversion failure.
        #[source]
        source: serde_json::Error,
    },

    /// The graph rejected a connection.
    #[error("cannot connect {from} to {to}: {source}")]
    Connection {
        /// Source reference, `instance.socket`.
        from: String,
        /// Destination reference, `instance.socket`.
        to: String,
        /// Rejection reason.
        #[source]
        source: GraphError,
    },

    /// A second connection feeds an already connected input.
    #[error("input {0} already has a source")]
    InputOccupied(String),

    /// A decoded value was rejected by the instance.
    #[error("invalid override: {0}")]
    Graph(#[from] GraphError),

    /// A problem inside one instance entry.
    #[error("instance {instance}: {source}")]
    InInstance {
        /// Key of the instance entry.
        instance: String,
        /// The problem.
        #[source]
        source: Box<DocumentError>,
    },
}

impl DocumentError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Attach the key of the instance entry the problem was found in.
    pub fn in_instance(self, instance: impl Into<String>) -> Self {
        DocumentError::InInstance {
            instance: instance.into(),
            source: Box::new(self),
        }
    }
}

/// Decoding stopped short of a clean result.
///
/// Carries every problem found, in document order, and whatever could be
/// built despite them. Decoding never stops at the first error. `Display`
/// joins the messages with `;`.
pub struct DecodeFailure<T> {
    /// Every problem found.
    pub errors: Vec<DocumentError>,
    /// The partial result, if anything could be built.
    pub partial: Option<T>,
}

impl<T> DecodeFailure<T> {
    pub(crate) fn new(errors: Vec<DocumentError>, partial: Option<T>) -> Self {
        Self { errors, partial }
    }

    /// Consumes the failure, keeping only the partial result.
    pub fn into_partial(self) -> Option<T> {
        self.partial
    }
}

impl<T> fmt::Display for DecodeFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for DecodeFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeFailure")
            .field("errors", &self.errors)
            .field("partial", &self.partial.is_some())
            .finish()
    }
}

impl<T> std::error::Error for DecodeFailure<T> {}
