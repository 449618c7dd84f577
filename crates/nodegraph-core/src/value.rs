//! Type-erased socket values and their runtime type tags.
//!
//! Sockets carry values of arbitrary Rust types. Inside the graph those values
//! travel as [`Value`], a cheaply clonable `Arc` around a [`SocketValue`]
//! trait object. Every value knows its [`ValueType`], which is what connection
//! checks and codecs key on.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime type tag of a socket value.
///
/// Two tags are equal when they describe the same Rust type. The name is kept
/// for diagnostics only.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    /// Returns the tag for `V`.
    pub fn of<V: 'static>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: std::any::type_name::<V>(),
        }
    }

    /// Returns the Rust type name this tag was created from.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this tag describes `V`.
    pub fn is<V: 'static>(&self) -> bool {
        self.id == TypeId::of::<V>()
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view of a value that can flow through a socket.
///
/// Implemented automatically for every `'static + Send + Sync + Debug +
/// PartialEq` type, so `f64`, `String` or user structs work without extra code.
pub trait SocketValue: Any + Send + Sync + fmt::Debug {
    /// Upcasts to `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the runtime tag of the concrete type.
    fn value_type(&self) -> ValueType;

    /// Compares with another erased value. Values of different types are never equal.
    fn eq_value(&self, other: &dyn SocketValue) -> bool;
}

impl<T> SocketValue for T
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn eq_value(&self, other: &dyn SocketValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// An immutable, shareable socket value.
///
/// Cloning a `Value` clones the `Arc`, not the payload.
#[derive(Clone)]
pub struct Value(Arc<dyn SocketValue>);

impl Value {
    /// Wraps a concrete value.
    pub fn new<V: SocketValue>(value: V) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the runtime tag of the wrapped value.
    pub fn value_type(&self) -> ValueType {
        self.0.as_ref().value_type()
    }

    /// Returns `true` if the wrapped value is a `V`.
    pub fn is<V: 'static>(&self) -> bool {
        self.value_type().is::<V>()
    }

    /// Borrows the wrapped value as `V`, if it is one.
    pub fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        self.0.as_ref().as_any().downcast_ref::<V>()
    }

    /// Returns a clone of the wrapped value as `V`, if it is one.
    pub fn get<V: Clone + 'static>(&self) -> Option<V> {
        self.downcast_ref::<V>().cloned()
    }

    /// Borrows the erased payload.
    pub fn as_socket_value(&self) -> &dyn SocketValue {
        self.0.as_ref()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.as_ref().eq_value(other.0.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_value_type_equality_ignores_name() {
        assert_eq!(ValueType::of::<f64>(), ValueType::of::<f64>());
        assert_ne!(ValueType::of::<f64>(), ValueType::of::<f32>());
        assert!(ValueType::of::<String>().is::<String>());
        assert_eq!(ValueType::of::<f64>().name(), "f64");
    }

    #[test]
    fn test_value_downcast() {
        let v = Value::new(3.5_f64);
        assert!(v.is::<f64>());
        assert_eq!(v.get::<f64>(), Some(3.5));
        assert_eq!(v.get::<f32>(), None);
        assert_eq!(v.value_type(), ValueType::of::<f64>());
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::new(1_i32), Value::new(1_i32));
        assert_ne!(Value::new(1_i32), Value::new(2_i32));
        // Same bits, different type
        assert_ne!(Value::new(1_i32), Value::new(1_u32));

        let p = Value::new(Point { x: 1, y: 2 });
        assert_eq!(p, p.clone());
        assert_eq!(p, Value::new(Point { x: 1, y: 2 }));
    }

    #[test]
    fn test_value_debug_is_transparent() {
        assert_eq!(format!("{:?}", Value::new(7.0_f64)), "7.0");
        assert_eq!(format!("{:?}", Value::new(String::from("a"))), "\"a\"");
    }
}
