//! # Type Layout Compiler
//!
//! Compiles [`IdlType`] expressions into [`Layout`] trees that encode
//! [`Value`]s to bytes and decode them back.
//!
//! ## Wire format
//!
//! Little-endian, no padding, fields in declaration order:
//!
//! | Type | Encoding |
//! |---|---|
//! | `bool`, `u8`, `i8` | 1 byte |
//! | `u16`/`i16`, `u32`/`i32`, `u64`/`i64`, `u128`/`i128` | 2, 4, 8, 16 bytes |
//! | `string`, `bytes` | `u32` length + raw content |
//! | `publicKey` | 32 raw bytes |
//! | `Vec<T>` | `u32` count + elements |
//! | `Option<T>` | `0` or `1` tag byte + element if present |
//! | `[T; n]` | n elements, no prefix |
//! | struct | fields in order |
//! | enum | `u8` variant index (declaration order) + variant fields |
//!
//! Layouts are pure values: compiling the same type against the same catalog
//! always yields an identical layout.

use crate::error::{Error, Result};
use crate::idl::{EnumFields, IdlField, IdlType, IdlTypeDef, IdlTypeDefTy};
use crate::value::{Field, Value};
use solana_sdk::pubkey::Pubkey;

const PUBKEY_SIZE: usize = 32;

/// Largest fixed-length array of zero-sized elements a decoder will build
pub const MAX_ZERO_SIZED_ELEMENTS: usize = 4096;

/// Compiled encoder/decoder for one type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    Bytes,
    String,
    PublicKey,
    Vec(Box<Layout>),
    Option(Box<Layout>),
    Array(Box<Layout>, usize),
    Struct(StructLayout),
    Enum(EnumLayout),
}

/// Named field inside a struct or enum variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub layout: Layout,
}

/// Ordered struct fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub fields: Vec<FieldLayout>,
}

/// Enum variant; `fields` is `None` for unit variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLayout {
    pub name: String,
    pub fields: Option<Vec<FieldLayout>>,
}

/// Enum variants, indexed by declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLayout {
    pub variants: Vec<VariantLayout>,
}

/// Compiles a single type expression against a catalog of named types
pub fn compile_field(ty: &IdlType, types: &[IdlTypeDef]) -> Result<Layout> {
    LayoutCompiler::new(types).compile_type(ty)
}

/// Compiles a named type definition (struct or enum body)
pub fn compile_type_def(def: &IdlTypeDef, types: &[IdlTypeDef]) -> Result<Layout> {
    let mut compiler = LayoutCompiler::new(types);
    compiler.resolving.push(def.name.clone());
    compiler.compile_def(def)
}

/// Compiles an ordered field list (instruction args, event fields) as one struct
pub fn compile_fields(fields: &[IdlField], types: &[IdlTypeDef]) -> Result<Layout> {
    let mut compiler = LayoutCompiler::new(types);
    Ok(Layout::Struct(StructLayout {
        fields: compiler.compile_field_list(fields)?,
    }))
}

struct LayoutCompiler<'a> {
    types: &'a [IdlTypeDef],
    /// `defined` names currently being expanded, outermost first
    resolving: Vec<String>,
}

impl<'a> LayoutCompiler<'a> {
    fn new(types: &'a [IdlTypeDef]) -> Self {
        Self {
            types,
            resolving: Vec::new(),
        }
    }

    fn compile_type(&mut self, ty: &IdlType) -> Result<Layout> {
        let layout = match ty {
            IdlType::Bool => Layout::Bool,
            IdlType::U8 => Layout::U8,
            IdlType::I8 => Layout::I8,
            IdlType::U16 => Layout::U16,
            IdlType::I16 => Layout::I16,
            IdlType::U32 => Layout::U32,
            IdlType::I32 => Layout::I32,
            IdlType::U64 => Layout::U64,
            IdlType::I64 => Layout::I64,
            IdlType::U128 => Layout::U128,
            IdlType::I128 => Layout::I128,
            IdlType::Bytes => Layout::Bytes,
            IdlType::String => Layout::String,
            IdlType::PublicKey => Layout::PublicKey,
            IdlType::Vec(inner) => Layout::Vec(Box::new(self.compile_type(inner)?)),
            IdlType::Option(inner) => Layout::Option(Box::new(self.compile_type(inner)?)),
            IdlType::Array(inner, len) => {
                Layout::Array(Box::new(self.compile_type(inner)?), *len)
            }
            IdlType::Defined(name) => self.compile_defined(name)?,
            IdlType::Unknown(tag) => {
                return Err(Error::NotImplemented {
                    type_name: tag.clone(),
                })
            }
            IdlType::Unrecognized(raw) => {
                return Err(Error::unsupported(format!("type expression {}", raw)))
            }
        };
        Ok(layout)
    }

    fn compile_defined(&mut self, name: &str) -> Result<Layout> {
        let mut matches = self.types.iter().filter(|t| t.name == name);
        let def = match (matches.next(), matches.next()) {
            (Some(def), None) => def,
            _ => {
                return Err(Error::TypeNotFound {
                    name: name.to_string(),
                })
            }
        };

        if self.resolving.iter().any(|n| n == name) {
            return Err(Error::unsupported(format!(
                "recursive type {} (via {})",
                name,
                self.resolving.join(" -> ")
            )));
        }

        self.resolving.push(name.to_string());
        let layout = self.compile_def(def);
        self.resolving.pop();
        layout
    }

    fn compile_def(&mut self, def: &IdlTypeDef) -> Result<Layout> {
        match &def.ty {
            IdlTypeDefTy::Struct { fields } => Ok(Layout::Struct(StructLayout {
                fields: self.compile_field_list(fields)?,
            })),
            IdlTypeDefTy::Enum { variants } => {
                if variants.len() > u8::MAX as usize + 1 {
                    return Err(Error::unsupported(format!(
                        "enum {} has {} variants",
                        def.name,
                        variants.len()
                    )));
                }
                let mut compiled = Vec::with_capacity(variants.len());
                for variant in variants {
                    if let Some(tag) = &variant.discriminant {
                        return Err(Error::unsupported(format!(
                            "explicit discriminant {} on {}::{}",
                            tag, def.name, variant.name
                        )));
                    }
                    let fields = match &variant.fields {
                        None => None,
                        Some(EnumFields::Named(fields)) => Some(self.compile_field_list(fields)?),
                        Some(EnumFields::Tuple(_)) => {
                            return Err(Error::unsupported(format!(
                                "tuple variant {}::{}",
                                def.name, variant.name
                            )))
                        }
                    };
                    compiled.push(VariantLayout {
                        name: variant.name.clone(),
                        fields,
                    });
                }
                Ok(Layout::Enum(EnumLayout { variants: compiled }))
            }
        }
    }

    fn compile_field_list(&mut self, fields: &[IdlField]) -> Result<Vec<FieldLayout>> {
        fields
            .iter()
            .map(|f| {
                Ok(FieldLayout {
                    name: f.name.clone(),
                    layout: self.compile_type(&f.ty)?,
                })
            })
            .collect()
    }
}

/// Cursor over a byte buffer; every read is bounds-checked
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::BufferUnderrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }
}

fn mismatch(layout: &Layout, value: &Value) -> Error {
    Error::TypeMismatch {
        expected: layout.type_name().to_string(),
        got: value.type_name().to_string(),
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| Error::invalid_data(format!("length {} exceeds u32 prefix", len)))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn encode_fields(fields: &[FieldLayout], value: &Value, out: &mut Vec<u8>) -> Result<()> {
    for field in fields {
        field.layout.encode(value.field(&field.name)?, out)?;
    }
    Ok(())
}

fn decode_fields(fields: &[FieldLayout], reader: &mut Reader) -> Result<Vec<Field>> {
    fields
        .iter()
        .map(|f| Ok((f.name.clone(), f.layout.decode_from(reader)?)))
        .collect()
}

fn fields_size(fields: &[FieldLayout]) -> Option<usize> {
    fields
        .iter()
        .try_fold(0usize, |acc, f| acc.checked_add(f.layout.fixed_size()?))
}

impl Layout {
    /// Short name used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Layout::Bool => "bool",
            Layout::U8 => "u8",
            Layout::I8 => "i8",
            Layout::U16 => "u16",
            Layout::I16 => "i16",
            Layout::U32 => "u32",
            Layout::I32 => "i32",
            Layout::U64 => "u64",
            Layout::I64 => "i64",
            Layout::U128 => "u128",
            Layout::I128 => "i128",
            Layout::Bytes => "bytes",
            Layout::String => "string",
            Layout::PublicKey => "publicKey",
            Layout::Vec(_) => "vec",
            Layout::Option(_) => "option",
            Layout::Array(..) => "array",
            Layout::Struct(_) => "struct",
            Layout::Enum(_) => "enum",
        }
    }

    /// Appends the encoding of `value` to `out`
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        match (self, value) {
            (Layout::Bool, Value::Bool(b)) => out.push(u8::from(*b)),
            (Layout::U8, Value::U8(n)) => out.push(*n),
            (Layout::I8, Value::I8(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::U16, Value::U16(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::I16, Value::I16(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::U32, Value::U32(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::I32, Value::I32(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::U64, Value::U64(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::I64, Value::I64(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::U128, Value::U128(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::I128, Value::I128(n)) => out.extend_from_slice(&n.to_le_bytes()),
            (Layout::Bytes, Value::Bytes(bytes)) => {
                write_len(bytes.len(), out)?;
                out.extend_from_slice(bytes);
            }
            (Layout::String, Value::String(s)) => {
                write_len(s.len(), out)?;
                out.extend_from_slice(s.as_bytes());
            }
            (Layout::PublicKey, Value::PublicKey(pk)) => out.extend_from_slice(&pk.to_bytes()),
            (Layout::Vec(inner), Value::Vec(items) | Value::Array(items)) => {
                write_len(items.len(), out)?;
                for item in items {
                    inner.encode(item, out)?;
                }
            }
            (Layout::Option(inner), Value::Option(opt)) => match opt {
                None => out.push(0),
                Some(v) => {
                    out.push(1);
                    inner.encode(v, out)?;
                }
            },
            (Layout::Array(inner, len), Value::Array(items) | Value::Vec(items)) => {
                if items.len() != *len {
                    return Err(Error::invalid_data(format!(
                        "array expects {} elements, got {}",
                        len,
                        items.len()
                    )));
                }
                for item in items {
                    inner.encode(item, out)?;
                }
            }
            (Layout::Struct(s), Value::Struct(_)) => encode_fields(&s.fields, value, out)?,
            (Layout::Enum(e), Value::Enum { variant, .. }) => {
                let index = e
                    .variants
                    .iter()
                    .position(|v| &v.name == variant)
                    .ok_or_else(|| Error::invalid_data(format!("unknown variant {}", variant)))?;
                // at most 256 variants, checked at compile time
                out.push(index as u8);
                if let Some(fields) = &e.variants[index].fields {
                    encode_fields(fields, value, out)?;
                }
            }
            _ => return Err(mismatch(self, value)),
        }
        Ok(())
    }

    /// Encodes `value` into a fresh buffer
    pub fn encode_to_vec(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.fixed_size().unwrap_or(64));
        self.encode(value, &mut out)?;
        Ok(out)
    }

    /// Decodes one value from the start of `bytes`; trailing bytes are ignored
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        self.decode_from(&mut Reader::new(bytes))
    }

    /// Decodes one value at the reader's position, advancing it
    pub fn decode_from(&self, reader: &mut Reader) -> Result<Value> {
        let value = match self {
            Layout::Bool => match reader.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(Error::invalid_data(format!("invalid bool byte {}", b))),
            },
            Layout::U8 => Value::U8(reader.read_u8()?),
            Layout::I8 => Value::I8(i8::from_le_bytes(reader.read_array()?)),
            Layout::U16 => Value::U16(u16::from_le_bytes(reader.read_array()?)),
            Layout::I16 => Value::I16(i16::from_le_bytes(reader.read_array()?)),
            Layout::U32 => Value::U32(u32::from_le_bytes(reader.read_array()?)),
            Layout::I32 => Value::I32(i32::from_le_bytes(reader.read_array()?)),
            Layout::U64 => Value::U64(u64::from_le_bytes(reader.read_array()?)),
            Layout::I64 => Value::I64(i64::from_le_bytes(reader.read_array()?)),
            Layout::U128 => Value::U128(u128::from_le_bytes(reader.read_array()?)),
            Layout::I128 => Value::I128(i128::from_le_bytes(reader.read_array()?)),
            Layout::Bytes => {
                let len = reader.read_len()?;
                Value::Bytes(reader.take(len)?.to_vec())
            }
            Layout::String => {
                let len = reader.read_len()?;
                let raw = reader.take(len)?;
                let s = std::str::from_utf8(raw)
                    .map_err(|e| Error::invalid_data(format!("invalid utf-8 string: {}", e)))?;
                Value::String(s.to_string())
            }
            Layout::PublicKey => {
                Value::PublicKey(Pubkey::new_from_array(reader.read_array::<PUBKEY_SIZE>()?))
            }
            Layout::Vec(inner) => {
                let count = reader.read_len()?;
                // zero-sized elements consume no input, so the count is unbounded
                if count > 0 && inner.is_zero_sized() {
                    return Err(Error::invalid_data(format!(
                        "vector of {} zero-sized elements",
                        count
                    )));
                }
                // never trust the prefix for preallocation
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    items.push(inner.decode_from(reader)?);
                }
                Value::Vec(items)
            }
            Layout::Option(inner) => match reader.read_u8()? {
                0 => Value::Option(None),
                1 => Value::some(inner.decode_from(reader)?),
                tag => return Err(Error::invalid_data(format!("invalid option tag {}", tag))),
            },
            Layout::Array(inner, len) => {
                if *len > MAX_ZERO_SIZED_ELEMENTS && inner.is_zero_sized() {
                    return Err(Error::invalid_data(format!(
                        "array of {} zero-sized elements",
                        len
                    )));
                }
                let mut items = Vec::with_capacity((*len).min(reader.remaining()));
                for _ in 0..*len {
                    items.push(inner.decode_from(reader)?);
                }
                Value::Array(items)
            }
            Layout::Struct(s) => Value::Struct(decode_fields(&s.fields, reader)?),
            Layout::Enum(e) => {
                let index = reader.read_u8()? as usize;
                let variant = e.variants.get(index).ok_or_else(|| {
                    Error::invalid_data(format!(
                        "variant index {} out of range ({} variants)",
                        index,
                        e.variants.len()
                    ))
                })?;
                let fields = match &variant.fields {
                    Some(fields) => Some(decode_fields(fields, reader)?),
                    None => None,
                };
                Value::Enum {
                    variant: variant.name.clone(),
                    fields,
                }
            }
        };
        Ok(value)
    }

    /// True when every value of this layout encodes to zero bytes
    pub fn is_zero_sized(&self) -> bool {
        match self {
            Layout::Struct(s) => s.fields.iter().all(|f| f.layout.is_zero_sized()),
            Layout::Array(inner, len) => *len == 0 || inner.is_zero_sized(),
            _ => false,
        }
    }

    /// Encoded size if every value of this layout has the same size
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Layout::Bool | Layout::U8 | Layout::I8 => Some(1),
            Layout::U16 | Layout::I16 => Some(2),
            Layout::U32 | Layout::I32 => Some(4),
            Layout::U64 | Layout::I64 => Some(8),
            Layout::U128 | Layout::I128 => Some(16),
            Layout::PublicKey => Some(PUBKEY_SIZE),
            Layout::Bytes | Layout::String | Layout::Vec(_) | Layout::Option(_) => None,
            Layout::Array(inner, len) => inner.fixed_size()?.checked_mul(*len),
            Layout::Struct(s) => fields_size(&s.fields),
            Layout::Enum(e) => {
                let mut sizes = e.variants.iter().map(|v| match &v.fields {
                    None => Some(0),
                    Some(fields) => fields_size(fields),
                });
                let first = sizes.next().unwrap_or(Some(0))?;
                for size in sizes {
                    if size? != first {
                        return None;
                    }
                }
                first.checked_add(1)
            }
        }
    }
}
