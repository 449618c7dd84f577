//! Node definitions and the context they process in.
//!
//! A [`NodeDefinition`] is the reusable description of a node type: its
//! sockets, how to create its persistent state, whether its outputs may be
//! memoized, and the processing logic. Definitions are shared by every
//! instance of the type through a [`Definition`] handle.
//!
//! # Example
//!
//! ```rust
//! use nodegraph_core::{
//!     EvalError, InputSocket, NodeDefinition, OutputSocket, PortList, ProcessContext,
//! };
//!
//! struct Add {
//!     ports: PortList,
//!     a: InputSocket<f64>,
//!     b: InputSocket<f64>,
//!     sum: OutputSocket<f64>,
//! }
//!
//! impl Add {
//!     fn new() -> Self {
//!         let mut ports = PortList::builder();
//!         let a = ports.input("a", 0.0);
//!         let b = ports.input("b", 0.0);
//!         let sum = ports.output("sum");
//!         Self { ports: ports.build(), a, b, sum }
//!     }
//! }
//!
//! impl<E: 'static> NodeDefinition<E> for Add {
//!     type State = ();
//!
//!     fn ports(&self) -> &PortList {
//!         &self.ports
//!     }
//!
//!     fn init_state(&self) {}
//!
//!     fn process(&self, ctx: &mut ProcessContext<'_, (), E>) -> Result<(), EvalError> {
//!         let sum = ctx.get(self.a)? + ctx.get(self.b)?;
//!         ctx.set(self.sum, sum)
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::graph::NodeId;
use crate::socket::{Direction, InputSocket, OutputSocket, PortId, PortList};
use crate::value::{SocketValue, Value, ValueType};

/// Behaviour shared by every instance of a node type.
///
/// `E` is the environment type of the graphs this definition is used in.
/// Definitions that do not care about the environment implement the trait
/// for every `E: 'static`.
pub trait NodeDefinition<E>: Send + Sync + 'static {
    /// Per-instance state that persists across evaluations within one round.
    type State: 'static;

    /// Ordered sockets of this node type.
    fn ports(&self) -> &PortList;

    /// Creates fresh state the first time an instance is processed in a round.
    fn init_state(&self) -> Self::State;

    /// Whether outputs may be reused for the rest of one top-level evaluation.
    ///
    /// Nodes with side effects or time-dependent outputs return `false` to run
    /// on every pull.
    fn should_cache(&self) -> bool {
        true
    }

    /// Human-readable label used in logs and diagnostics.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Reads inputs, updates state and writes outputs.
    fn process(&self, ctx: &mut ProcessContext<'_, Self::State, E>) -> Result<(), EvalError>;
}

/// Value access the evaluator grants a node while it processes.
pub(crate) trait NodeIo<E> {
    fn node(&self) -> NodeId;
    fn environment(&mut self) -> &mut E;
    fn read_input(&mut self, port: PortId) -> Result<Value, EvalError>;
    fn write_output(&mut self, port: PortId, value: Value) -> Result<(), EvalError>;
}

/// Object-safe projection of [`NodeDefinition`] with the state type erased.
pub(crate) trait ErasedDefinition<E>: Send + Sync {
    fn dyn_ports(&self) -> &PortList;
    fn dyn_label(&self) -> &str;
    fn dyn_should_cache(&self) -> bool;
    fn dyn_init_state(&self) -> Box<dyn Any>;
    fn dyn_process(&self, state: &mut dyn Any, io: &mut dyn NodeIo<E>) -> Result<(), EvalError>;
    fn dyn_as_any(&self) -> &dyn Any;
}

impl<E, T> ErasedDefinition<E> for T
where
    T: NodeDefinition<E>,
{
    fn dyn_ports(&self) -> &PortList {
        self.ports()
    }

    fn dyn_label(&self) -> &str {
        self.label()
    }

    fn dyn_should_cache(&self) -> bool {
        self.should_cache()
    }

    fn dyn_init_state(&self) -> Box<dyn Any> {
        Box::new(self.init_state())
    }

    fn dyn_process(&self, state: &mut dyn Any, io: &mut dyn NodeIo<E>) -> Result<(), EvalError> {
        let node = io.node();
        let state = state
            .downcast_mut::<T::State>()
            .ok_or(EvalError::StateMismatch { node })?;
        let mut ctx = ProcessContext {
            state,
            io,
            ports: self.ports(),
        };
        self.process(&mut ctx)
    }

    fn dyn_as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to a node definition.
///
/// Cloning the handle shares the definition. Two handles are the same
/// definition when [`ptr_eq`](Definition::ptr_eq) says so, which is how
/// registries map definitions back to identifiers.
pub struct Definition<E> {
    inner: Arc<dyn ErasedDefinition<E>>,
}

impl<E: 'static> Definition<E> {
    /// Wraps a definition.
    pub fn new<T: NodeDefinition<E>>(definition: T) -> Self {
        Self {
            inner: Arc::new(definition),
        }
    }

    /// Wraps an already shared definition without copying it.
    pub fn from_arc<T: NodeDefinition<E>>(definition: Arc<T>) -> Self {
        Self { inner: definition }
    }

    /// Ordered sockets of the definition.
    pub fn ports(&self) -> &PortList {
        self.inner.dyn_ports()
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        self.inner.dyn_label()
    }

    /// Whether outputs are memoized within one top-level evaluation.
    pub fn should_cache(&self) -> bool {
        self.inner.dyn_should_cache()
    }

    /// Returns `true` if both handles point at the same definition.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Borrows the concrete definition, e.g. to reach its socket handles.
    pub fn downcast_ref<T: NodeDefinition<E>>(&self) -> Option<&T> {
        self.inner.dyn_as_any().downcast_ref::<T>()
    }

    pub(crate) fn init_state(&self) -> Box<dyn Any> {
        self.inner.dyn_init_state()
    }

    pub(crate) fn process(
        &self,
        state: &mut dyn Any,
        io: &mut dyn NodeIo<E>,
    ) -> Result<(), EvalError> {
        self.inner.dyn_process(state, io)
    }
}

impl<E> Clone for Definition<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Definition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("label", &self.inner.dyn_label())
            .field("ports", &self.inner.dyn_ports().len())
            .finish()
    }
}

/// Everything a node can touch while it processes.
///
/// Reading an input that is connected evaluates the upstream node first, so
/// inputs a node never reads are never computed.
pub struct ProcessContext<'a, S, E> {
    state: &'a mut S,
    io: &'a mut dyn NodeIo<E>,
    ports: &'a PortList,
}

impl<S, E> ProcessContext<'_, S, E> {
    /// Node being processed.
    pub fn node(&self) -> NodeId {
        self.io.node()
    }

    /// Persistent state of this instance for the current round.
    pub fn state(&mut self) -> &mut S {
        self.state
    }

    /// Environment of the evaluation round.
    pub fn environment(&mut self) -> &mut E {
        self.io.environment()
    }

    /// Reads a typed input.
    pub fn get<V: SocketValue + Clone>(&mut self, socket: InputSocket<V>) -> Result<V, EvalError> {
        let value = self.get_value(socket.port())?;
        match value.downcast_ref::<V>() {
            Some(v) => Ok(v.clone()),
            None => Err(EvalError::TypeMismatch {
                node: self.node(),
                socket: self.socket_name(socket.port()),
                expected: ValueType::of::<V>(),
                found: value.value_type(),
            }),
        }
    }

    /// Reads an input by port without a static type.
    pub fn get_value(&mut self, port: PortId) -> Result<Value, EvalError> {
        self.io.read_input(port)
    }

    /// Writes a typed output.
    pub fn set<V: SocketValue>(&mut self, socket: OutputSocket<V>, value: V) -> Result<(), EvalError> {
        self.set_value(socket.port(), Value::new(value))
    }

    /// Writes an output by port. The value must match the socket's type.
    pub fn set_value(&mut self, port: PortId, value: Value) -> Result<(), EvalError> {
        self.io.write_output(port, value)
    }

    /// Builds a [`EvalError::NodeFailed`] for this node.
    pub fn fail(&self, message: impl Into<String>) -> EvalError {
        EvalError::NodeFailed {
            node: self.node(),
            message: message.into(),
        }
    }

    fn socket_name(&self, port: PortId) -> String {
        self.ports
            .get(port)
            .map(|s| s.name().to_owned())
            .unwrap_or_default()
    }
}

/// Checks that `port` exists on `ports` with the expected direction.
pub(crate) fn expect_socket(
    ports: &PortList,
    node: NodeId,
    port: PortId,
    expected: Direction,
) -> Result<&crate::socket::Socket, EvalError> {
    let socket = ports.get(port).ok_or(EvalError::PortNotFound { node, port })?;
    if socket.direction() != expected {
        return Err(EvalError::WrongDirection {
            node,
            socket: socket.name().to_owned(),
            expected,
        });
    }
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        ports: PortList,
    }

    impl NodeDefinition<()> for Sample {
        type State = u32;

        fn ports(&self) -> &PortList {
            &self.ports
        }

        fn init_state(&self) -> u32 {
            41
        }

        fn should_cache(&self) -> bool {
            false
        }

        fn label(&self) -> &str {
            "sample"
        }

        fn process(&self, ctx: &mut ProcessContext<'_, u32, ()>) -> Result<(), EvalError> {
            *ctx.state() += 1;
            Ok(())
        }
    }

    fn sample() -> Definition<()> {
        Definition::new(Sample {
            ports: PortList::builder().build(),
        })
    }

    #[test]
    fn test_definition_metadata() {
        let def = sample();
        assert_eq!(def.label(), "sample");
        assert!(!def.should_cache());
        assert!(def.ports().is_empty());
        assert!(def.downcast_ref::<Sample>().is_some());
    }

    #[test]
    fn test_definition_identity() {
        let a = sample();
        let b = sample();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_init_state_is_erased_state_type() {
        let def = sample();
        let state = def.init_state();
        assert_eq!(state.downcast_ref::<u32>(), Some(&41));
    }
}
