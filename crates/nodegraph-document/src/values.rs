//! Per-type value codecs.
//!
//! A [`ValueCodecs`] table converts socket values of registered types to and
//! from JSON values through their serde implementations.

use std::collections::HashMap;

use nodegraph_core::{SocketValue, Value, ValueType};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DocumentError;

type EncodeFn = Box<dyn Fn(&Value) -> Result<serde_json::Value, serde_json::Error> + Send + Sync>;
type DecodeFn = Box<dyn Fn(serde_json::Value) -> Result<Value, serde_json::Error> + Send + Sync>;

struct Codec {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Table of value codecs keyed by value type.
#[derive(Default)]
pub struct ValueCodecs {
    codecs: HashMap<ValueType, Codec>,
}

impl ValueCodecs {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with codecs for `bool`, `i8`, `i16`, `i32`, `i64`,
    /// `f32`, `f64` and `String`.
    pub fn with_primitives() -> Self {
        let mut table = Self::new();
        table
            .register::<bool>()
            .register::<i8>()
            .register::<i16>()
            .register::<i32>()
            .register::<i64>()
            .register::<f32>()
            .register::<f64>()
            .register::<String>();
        table
    }

    /// Registers the serde codec of `V`, replacing any previous one.
    pub fn register<V: SocketValue + Serialize + DeserializeOwned>(&mut self) -> &mut Self {
        let codec = Codec {
            encode: Box::new(|value: &Value| match value.downcast_ref::<V>() {
                Some(v) => serde_json::to_value(v),
                None => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                    "expected {}, got {}",
                    ValueType::of::<V>(),
                    value.value_type()
                ))),
            }),
            decode: Box::new(|json: serde_json::Value| serde_json::from_value::<V>(json).map(Value::new)),
        };
        self.codecs.insert(ValueType::of::<V>(), codec);
        self
    }

    /// Returns `true` if a codec for this type is registered.
    pub fn contains(&self, value_type: ValueType) -> bool {
        self.codecs.contains_key(&value_type)
    }

    /// Encodes the value of `socket` with the codec of its own type.
    pub fn encode(&self, socket: &str, value: &Value) -> Result<serde_json::Value, DocumentError> {
        let codec = self.codec(socket, value.value_type())?;
        (codec.encode)(value).map_err(|source| DocumentError::BadValue {
            socket: socket.to_owned(),
            source,
        })
    }

    /// Decodes a value of `socket`'s declared type.
    pub fn decode(
        &self,
        socket: &str,
        value_type: ValueType,
        json: &serde_json::Value,
    ) -> Result<Value, DocumentError> {
        let codec = self.codec(socket, value_type)?;
        (codec.decode)(json.clone()).map_err(|source| DocumentError::BadValue {
            socket: socket.to_owned(),
            source,
        })
    }

    fn codec(&self, socket: &str, value_type: ValueType) -> Result<&Codec, DocumentError> {
        self.codecs
            .get(&value_type)
            .ok_or_else(|| DocumentError::NoValueCodec {
                socket: socket.to_owned(),
                value_type,
            })
    }
}

impl std::fmt::Debug for ValueCodecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rgb {
        r: u8,
        g: u8,
        b: u8,
    }

    #[test]
    fn test_primitives() {
        let table = ValueCodecs::with_primitives();
        assert_eq!(table.encode("x", &Value::new(2.5_f64)).unwrap(), json!(2.5));
        assert_eq!(
            table.encode("s", &Value::new(String::from("hi"))).unwrap(),
            json!("hi")
        );
        let decoded = table
            .decode("flag", ValueType::of::<bool>(), &json!(true))
            .unwrap();
        assert_eq!(decoded, Value::new(true));
    }

    #[test]
    fn test_integer_text_decodes_as_float() {
        let table = ValueCodecs::with_primitives();
        let decoded = table.decode("a", ValueType::of::<f64>(), &json!(7)).unwrap();
        assert_eq!(decoded.get::<f64>(), Some(7.0));
    }

    #[test]
    fn test_custom_type() {
        let mut table = ValueCodecs::new();
        table.register::<Rgb>();
        let color = Value::new(Rgb { r: 1, g: 2, b: 3 });
        let encoded = table.encode("tint", &color).unwrap();
        assert_eq!(encoded, json!({ "r": 1, "g": 2, "b": 3 }));
        assert_eq!(
            table.decode("tint", ValueType::of::<Rgb>(), &encoded).unwrap(),
            color
        );
    }

    #[test]
    fn test_wrong_shape_is_bad_value() {
        let table = ValueCodecs::with_primitives();
        let err = table
            .decode("a", ValueType::of::<f64>(), &json!("seven"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::BadValue { ref socket, .. } if socket == "a"));
    }

    #[test]
    fn test_missing_codec() {
        let table = ValueCodecs::new();
        let err = table.encode("n", &Value::new(1_u64)).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::NoValueCodec { value_type, .. } if value_type.is::<u64>()
        ));
    }
}
