use std::fmt;

use crate::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

/// A named field of a struct value or a struct-like enum variant
pub type Field = (String, Value);

/// Dynamic value that a compiled layout encodes from and decodes to
///
/// Struct fields keep their declaration order. The wire format never looks
/// at field names; they only give the decoded value its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    // Scalars
    /// Boolean (1 byte)
    Bool(bool),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 128-bit integer
    U128(u128),
    /// Signed 128-bit integer
    I128(i128),
    /// Length-prefixed raw bytes
    Bytes(Vec<u8>),
    /// Length-prefixed UTF-8 string
    String(String),
    /// 32-byte address
    PublicKey(Pubkey),

    // Compound
    /// Length-prefixed sequence
    Vec(Vec<Value>),
    /// Fixed-length sequence
    Array(Vec<Value>),
    /// Optional value
    Option(Option<Box<Value>>),
    /// Struct with ordered named fields
    Struct(Vec<Field>),
    /// Enum variant, with named fields unless it is a unit variant
    Enum {
        /// Variant name
        variant: String,
        /// Variant fields (`None` for unit variants)
        fields: Option<Vec<Field>>,
    },
}

impl Value {
    /// Creates a struct value from `(name, value)` pairs
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates a unit enum variant
    pub fn unit_variant(variant: impl Into<String>) -> Self {
        Value::Enum {
            variant: variant.into(),
            fields: None,
        }
    }

    /// Creates an enum variant carrying named fields
    pub fn variant<I, S>(variant: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Enum {
            variant: variant.into(),
            fields: Some(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// `Some(v)` option value
    pub fn some(value: Value) -> Self {
        Value::Option(Some(Box::new(value)))
    }

    /// `None` option value
    pub fn none() -> Self {
        Value::Option(None)
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::U128(_) => "u128",
            Value::I128(_) => "i128",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::PublicKey(_) => "publicKey",
            Value::Vec(_) => "vec",
            Value::Array(_) => "array",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Enum { .. } => "enum",
        }
    }

    /// Looks up a struct field (or a struct-like variant field) by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        let fields = match self {
            Value::Struct(fields) => fields,
            Value::Enum {
                fields: Some(fields),
                ..
            } => fields,
            _ => return None,
        };
        fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Like [`Value::get`], but a missing field is an error
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::MissingField {
            field: name.to_string(),
        })
    }

    /// Widens any unsigned integer value to `u128`
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Value::U8(n) => Some(*n as u128),
            Value::U16(n) => Some(*n as u128),
            Value::U32(n) => Some(*n as u128),
            Value::U64(n) => Some(*n as u128),
            Value::U128(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrows a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the address held by a public key value
    pub fn as_pubkey(&self) -> Option<Pubkey> {
        match self {
            Value::PublicKey(pk) => Some(*pk),
            _ => None,
        }
    }
}

fn write_fields(f: &mut fmt::Formatter, fields: &[Field]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, val)) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", key, val)?;
    }
    write!(f, "}}")
}

fn write_seq(f: &mut fmt::Formatter, values: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, val) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", val)?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::U8(n) => write!(f, "{}", n),
            Value::I8(n) => write!(f, "{}", n),
            Value::U16(n) => write!(f, "{}", n),
            Value::I16(n) => write!(f, "{}", n),
            Value::U32(n) => write!(f, "{}", n),
            Value::I32(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::U128(n) => write!(f, "{}", n),
            Value::I128(n) => write!(f, "{}", n),
            Value::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::PublicKey(pk) => write!(f, "{}", pk),
            Value::Vec(values) | Value::Array(values) => write_seq(f, values),
            Value::Option(None) => write!(f, "null"),
            Value::Option(Some(inner)) => write!(f, "{}", inner),
            Value::Struct(fields) => write_fields(f, fields),
            Value::Enum { variant, fields } => {
                write!(f, "{}", variant)?;
                match fields {
                    Some(fields) => {
                        write!(f, " ")?;
                        write_fields(f, fields)
                    }
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let v = Value::structure([("a", Value::U8(1)), ("b", Value::String("x".into()))]);
        assert_eq!(v.get("a"), Some(&Value::U8(1)));
        assert!(v.get("c").is_none());
        assert_eq!(
            v.field("c"),
            Err(Error::MissingField {
                field: "c".to_string()
            })
        );
    }

    #[test]
    fn test_display() {
        let v = Value::structure([
            ("data", Value::U64(42)),
            ("tags", Value::Vec(vec![Value::U8(1), Value::U8(2)])),
            ("maybe", Value::none()),
            ("kind", Value::unit_variant("Open")),
        ]);
        assert_eq!(v.to_string(), "{data: 42, tags: [1, 2], maybe: null, kind: Open}");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "0xdead");
    }
}
