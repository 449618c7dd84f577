//! Socket descriptors and the ordered port list of a node definition.
//!
//! A definition declares its sockets once through a [`PortListBuilder`] and
//! keeps the returned typed handles ([`InputSocket`], [`OutputSocket`]) to read
//! and write values in `process`. Everything the graph stores refers to
//! sockets by [`PortId`], the position of the socket in its [`PortList`].
//!
//! ```rust
//! use nodegraph_core::{Direction, PortList};
//!
//! let mut ports = PortList::builder();
//! let a = ports.input("a", 0.0_f64);
//! let sum = ports.output::<f64>("sum");
//! let ports = ports.build();
//!
//! assert_eq!(ports.find_input("a"), Some(a.port()));
//! assert_eq!(ports[sum.port()].direction(), Direction::Output);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;

use crate::value::{SocketValue, Value, ValueType};

/// Whether a socket consumes or produces values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Consumes a value from a connection, an override or its default.
    Input,
    /// Produces a value during processing.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Position of a socket inside its definition's [`PortList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub(crate) u32);

impl PortId {
    /// Returns the raw index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortId({})", self.0)
    }
}

/// Descriptor of one socket: direction, value type, name and, for inputs, the default.
#[derive(Clone, Debug)]
pub struct Socket {
    direction: Direction,
    value_type: ValueType,
    name: String,
    default: Option<Value>,
}

impl Socket {
    /// Socket direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Type of the values this socket carries.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Socket name, unique per direction within a definition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default value. Always present for inputs, always `None` for outputs.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Shorthand for `direction() == Direction::Input`.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }
}

/// Typed handle to an input socket.
pub struct InputSocket<V> {
    port: PortId,
    _value: PhantomData<fn() -> V>,
}

/// Typed handle to an output socket.
pub struct OutputSocket<V> {
    port: PortId,
    _value: PhantomData<fn() -> V>,
}

macro_rules! socket_handle {
    ($handle:ident) => {
        impl<V> $handle<V> {
            /// Port this handle refers to.
            #[inline]
            pub fn port(self) -> PortId {
                self.port
            }
        }

        impl<V> Clone for $handle<V> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<V> Copy for $handle<V> {}

        impl<V> PartialEq for $handle<V> {
            fn eq(&self, other: &Self) -> bool {
                self.port == other.port
            }
        }

        impl<V> Eq for $handle<V> {}

        impl<V> fmt::Debug for $handle<V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "{}<{}>({})",
                    stringify!($handle),
                    std::any::type_name::<V>(),
                    self.port.0
                )
            }
        }

        impl<V> From<$handle<V>> for PortId {
            fn from(handle: $handle<V>) -> PortId {
                handle.port
            }
        }
    };
}

socket_handle!(InputSocket);
socket_handle!(OutputSocket);

/// Ordered, immutable list of the sockets a definition declares.
#[derive(Clone, Debug, Default)]
pub struct PortList {
    sockets: Vec<Socket>,
}

impl PortList {
    /// Starts declaring sockets.
    pub fn builder() -> PortListBuilder {
        PortListBuilder {
            sockets: Vec::new(),
        }
    }

    /// Returns the socket at `port`.
    pub fn get(&self, port: PortId) -> Option<&Socket> {
        self.sockets.get(port.0 as usize)
    }

    /// Iterates all sockets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PortId, &Socket)> {
        self.sockets
            .iter()
            .enumerate()
            .map(|(i, socket)| (PortId(i as u32), socket))
    }

    /// Iterates input sockets in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = (PortId, &Socket)> {
        self.iter().filter(|(_, s)| s.direction == Direction::Input)
    }

    /// Iterates output sockets in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (PortId, &Socket)> {
        self.iter().filter(|(_, s)| s.direction == Direction::Output)
    }

    /// Finds a socket by direction and name.
    pub fn find(&self, direction: Direction, name: &str) -> Option<PortId> {
        self.iter()
            .find(|(_, s)| s.direction == direction && s.name == name)
            .map(|(port, _)| port)
    }

    /// Finds an input socket by name.
    pub fn find_input(&self, name: &str) -> Option<PortId> {
        self.find(Direction::Input, name)
    }

    /// Finds an output socket by name.
    pub fn find_output(&self, name: &str) -> Option<PortId> {
        self.find(Direction::Output, name)
    }

    /// Number of sockets.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Returns `true` if the definition declares no sockets.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl Index<PortId> for PortList {
    type Output = Socket;

    fn index(&self, port: PortId) -> &Socket {
        &self.sockets[port.0 as usize]
    }
}

/// Collects socket declarations and hands out typed handles.
#[derive(Debug)]
pub struct PortListBuilder {
    sockets: Vec<Socket>,
}

impl PortListBuilder {
    /// Declares an input socket with the value used when nothing else supplies one.
    pub fn input<V: SocketValue>(
        &mut self,
        name: impl Into<String>,
        default: V,
    ) -> InputSocket<V> {
        let port = self.push(
            Direction::Input,
            ValueType::of::<V>(),
            name.into(),
            Some(Value::new(default)),
        );
        InputSocket {
            port,
            _value: PhantomData,
        }
    }

    /// Declares an output socket.
    pub fn output<V: SocketValue>(&mut self, name: impl Into<String>) -> OutputSocket<V> {
        let port = self.push(Direction::Output, ValueType::of::<V>(), name.into(), None);
        OutputSocket {
            port,
            _value: PhantomData,
        }
    }

    /// Finishes the list.
    pub fn build(self) -> PortList {
        PortList {
            sockets: self.sockets,
        }
    }

    fn push(
        &mut self,
        direction: Direction,
        value_type: ValueType,
        name: String,
        default: Option<Value>,
    ) -> PortId {
        debug_assert!(
            !self
                .sockets
                .iter()
                .any(|s| s.direction == direction && s.name == name),
            "duplicate {direction} socket name '{name}'"
        );
        let port = PortId(self.sockets.len() as u32);
        self.sockets.push(Socket {
            direction,
            value_type,
            name,
            default,
        });
        port
    }
}
