//! Per-type value serializers.
//!
//! Socket values are opaque to the format; a [`ValueSerializers`] table maps
//! each [`ValueType`] to a pair of functions that write and read it.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use nodegraph_core::{SocketValue, Value, ValueType};

use crate::data::{DataRead, DataWrite};
use crate::error::SerializeError;

type WriteFn = Box<dyn Fn(&Value, &mut dyn Write) -> io::Result<()> + Send + Sync>;
type ReadFn = Box<dyn Fn(&mut dyn Read) -> io::Result<Value> + Send + Sync>;

struct Codec {
    write: WriteFn,
    read: ReadFn,
}

/// Table of value serializers keyed by value type.
#[derive(Default)]
pub struct ValueSerializers {
    codecs: HashMap<ValueType, Codec>,
}

impl ValueSerializers {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with serializers for `bool`, `i8`, `i16`, `i32`,
    /// `i64`, `f32`, `f64` and `String`.
    pub fn with_primitives() -> Self {
        let mut table = Self::new();
        table
            .register::<bool>(|v, w| w.write_bool(*v), |r| r.read_bool())
            .register::<i8>(|v, w| w.write_u8(v.to_be_bytes()[0]), |r| {
                Ok(i8::from_be_bytes([r.read_u8()?]))
            })
            .register::<i16>(|v, w| w.write_i16(*v), |r| r.read_i16())
            .register::<i32>(|v, w| w.write_i32(*v), |r| r.read_i32())
            .register::<i64>(|v, w| w.write_i64(*v), |r| r.read_i64())
            .register::<f32>(|v, w| w.write_f32(*v), |r| r.read_f32())
            .register::<f64>(|v, w| w.write_f64(*v), |r| r.read_f64())
            .register::<String>(|v, w| w.write_utf(v), |r| r.read_utf());
        table
    }

    /// Registers the serializer pair for `V`, replacing any previous one.
    pub fn register<V: SocketValue>(
        &mut self,
        write: fn(&V, &mut dyn Write) -> io::Result<()>,
        read: fn(&mut dyn Read) -> io::Result<V>,
    ) -> &mut Self {
        let codec = Codec {
            write: Box::new(move |value: &Value, out: &mut dyn Write| match value.downcast_ref::<V>() {
                Some(v) => write(v, out),
                None => Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("expected {}, got {}", ValueType::of::<V>(), value.value_type()),
                )),
            }),
            read: Box::new(move |input: &mut dyn Read| read(input).map(Value::new)),
        };
        self.codecs.insert(ValueType::of::<V>(), codec);
        self
    }

    /// Returns `true` if a serializer for this type is registered.
    pub fn contains(&self, value_type: ValueType) -> bool {
        self.codecs.contains_key(&value_type)
    }

    /// Writes a value with the serializer of its own type.
    pub fn write_value(&self, value: &Value, out: &mut dyn Write) -> Result<(), SerializeError> {
        let codec = self
            .codecs
            .get(&value.value_type())
            .ok_or(SerializeError::NoValueSerializer(value.value_type()))?;
        (codec.write)(value, out)?;
        Ok(())
    }

    /// Reads a value of the given type.
    pub fn read_value(
        &self,
        value_type: ValueType,
        input: &mut dyn Read,
    ) -> Result<Value, SerializeError> {
        let codec = self
            .codecs
            .get(&value_type)
            .ok_or(SerializeError::NoValueSerializer(value_type))?;
        Ok((codec.read)(input)?)
    }
}

impl std::fmt::Debug for ValueSerializers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}
