//! Error types for the binary stream format.

use std::io;

use nodegraph_core::{GraphError, ValueType};
use thiserror::Error;

/// Errors that can occur while writing or reading a graph stream.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The underlying stream failed or held malformed primitives.
    #[error("stream error: {0}")]
    Io(#[from] io::Error),

    /// The stream was written by a newer version of this format.
    #[error("version {0} is not supported, please update")]
    UnsupportedVersion(i32),

    /// The stream was written by an old version that is no longer readable.
    #[error("version {0} is no longer supported")]
    RetiredVersion(i32),

    /// A node identifier in the stream is not known to the registry.
    #[error("missing node with id '{0}'")]
    UnknownNode(String),

    /// A definition in the graph has no identifier in the registry.
    #[error("missing id for node '{0}'")]
    UnregisteredDefinition(String),

    /// A socket name in the stream does not exist on the node.
    #[error("unknown socket '{socket}' in node '{node}'")]
    UnknownSocket {
        /// Socket name from the stream.
        socket: String,
        /// Node identifier or label.
        node: String,
    },

    /// No value serializer is registered for a socket's type.
    #[error("no value serializer registered for {0}")]
    NoValueSerializer(ValueType),

    /// A connection refers to an instance index outside the stream's instance list.
    #[error("instance index {index} out of range (stream has {count} instances)")]
    InstanceOutOfRange {
        /// Index from the stream.
        index: i32,
        /// Number of instances in the stream.
        count: usize,
    },

    /// The reserved per-instance parameter block was not empty.
    #[error("unexpected node parameter block of {0} entries")]
    UnexpectedParameters(usize),

    /// Two connections in the stream feed the same input.
    #[error("input {0} already has a source")]
    InputOccupied(String),

    /// The decoded topology was rejected by the graph.
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display() {
        assert_eq!(
            SerializeError::UnsupportedVersion(7).to_string(),
            "version 7 is not supported, please update"
        );
        assert_eq!(
            SerializeError::RetiredVersion(0).to_string(),
            "version 0 is no longer supported"
        );
        assert_eq!(
            SerializeError::UnknownSocket {
                socket: "c".into(),
                node: "add".into()
            }
            .to_string(),
            "unknown socket 'c' in node 'add'"
        );
    }

    #[test]
    fn test_io_source_preserved() {
        let err = SerializeError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(err.source().is_some());
    }
}
