//! # Anchor IDL Model
//!
//! Serde model of an Anchor-style IDL document (legacy layout, pre Anchor 0.30)
//! and the closed [`IdlType`] union every codec is compiled from.
//!
//! ## IDL Format
//! ```json
//! {
//!   "version": "0.1.0",
//!   "name": "program_name",
//!   "instructions": [...],
//!   "state": { "struct": {...}, "methods": [...] },
//!   "accounts": [...],
//!   "types": [...],
//!   "events": [...],
//!   "errors": [...],
//!   "metadata": { "address": "..." }
//! }
//! ```
//!
//! Type expressions are converted to [`IdlType`] once, while the JSON is
//! parsed. Anything this crate does not understand is kept as
//! [`IdlType::Unknown`] or [`IdlType::Unrecognized`] so the layout compiler
//! can reject it with a precise error instead of failing the whole document.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{Error, Result};

/// Anchor IDL document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idl {
    /// IDL format version (e.g., "0.1.0")
    #[serde(default)]
    pub version: String,
    /// Program name
    pub name: String,
    /// Program instructions (global namespace)
    #[serde(default)]
    pub instructions: Vec<IdlInstruction>,
    /// Legacy program state (singleton account + state methods)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IdlState>,
    /// Account type definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<IdlTypeDef>,
    /// Custom type definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<IdlTypeDef>,
    /// Event definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<IdlEvent>,
    /// Error code definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<IdlErrorCode>,
    /// Program metadata (e.g., deployed address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IdlMetadata>,
}

/// Instruction (or legacy state method) definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlInstruction {
    /// Instruction name (camelCase)
    pub name: String,
    /// Accounts required by this instruction
    #[serde(default)]
    pub accounts: Vec<IdlAccountItem>,
    /// Instruction arguments, encoded as one struct in declaration order
    #[serde(default)]
    pub args: Vec<IdlField>,
}

/// Legacy `state` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlState {
    /// The singleton state account
    #[serde(rename = "struct")]
    pub strct: IdlTypeDef,
    /// Methods dispatched under the `state` sighash namespace
    #[serde(default)]
    pub methods: Vec<IdlInstruction>,
}

/// Either a single account or a nested group of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdlAccountItem {
    /// Composite accounts struct
    Accounts(IdlAccounts),
    /// Single account
    Account(IdlAccount),
}

/// Composite group of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlAccounts {
    /// Group name
    pub name: String,
    /// Members of the group
    pub accounts: Vec<IdlAccountItem>,
}

/// Account metadata for an instruction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlAccount {
    /// Account name
    pub name: String,
    /// Whether the account is mutable (writable)
    #[serde(default, alias = "writable")]
    pub is_mut: bool,
    /// Whether the account must sign the transaction
    #[serde(default, alias = "signer")]
    pub is_signer: bool,
    /// Optional documentation for this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<String>>,
}

/// Named, typed field (struct field or instruction argument)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub ty: IdlType,
}

impl IdlField {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, ty: IdlType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Event definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlEvent {
    /// Event name
    pub name: String,
    /// Event fields, encoded as a struct in declaration order
    #[serde(default)]
    pub fields: Vec<IdlEventField>,
}

/// Event field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlEventField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub ty: IdlType,
    /// Whether the field is marked `#[index]`
    #[serde(default)]
    pub index: bool,
}

/// Named type definition (account or custom type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlTypeDef {
    /// Type name
    pub name: String,
    /// Type structure (struct or enum)
    #[serde(rename = "type")]
    pub ty: IdlTypeDefTy,
}

/// Type definition inner structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IdlTypeDefTy {
    /// Struct type with named fields
    #[serde(rename = "struct")]
    Struct {
        /// Struct field definitions
        #[serde(default)]
        fields: Vec<IdlField>,
    },
    /// Enum type with variants
    #[serde(rename = "enum")]
    Enum {
        /// Enum variant definitions
        variants: Vec<IdlEnumVariant>,
    },
}

/// Enum variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlEnumVariant {
    /// Variant name
    pub name: String,
    /// Variant fields; absent for unit variants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<EnumFields>,
    /// Explicit discriminant. Never honoured: variants are indexed by
    /// declaration order and a present value fails compilation.
    #[serde(
        default,
        alias = "value",
        skip_serializing_if = "Option::is_none"
    )]
    pub discriminant: Option<JsonValue>,
}

/// Fields of an enum variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumFields {
    /// Struct-like variant: `Foo { a: u8 }`
    Named(Vec<IdlField>),
    /// Tuple variant: `Foo(u8, u16)`. Not supported by the layout compiler.
    Tuple(Vec<IdlType>),
}

/// Error code definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlErrorCode {
    /// Error code (typically 6000+ for custom errors)
    pub code: u32,
    /// Error name (PascalCase)
    pub name: String,
    /// Optional error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdlMetadata {
    /// Deployed program address (base58 encoded public key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Closed union of IDL type expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum IdlType {
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
    /// Length-prefixed byte vector
    Bytes,
    /// Length-prefixed UTF-8 string
    String,
    /// 32-byte address
    PublicKey,
    /// Length-prefixed sequence
    Vec(Box<IdlType>),
    /// Tagged optional value
    Option(Box<IdlType>),
    /// Fixed-size array
    Array(Box<IdlType>, usize),
    /// Reference to a named type in `types` (or `accounts`)
    Defined(String),
    /// Scalar tag this crate has no layout for (e.g. `"f64"`)
    Unknown(String),
    /// JSON shape that is not a type expression this crate recognizes
    Unrecognized(JsonValue),
}

impl IdlType {
    /// Parses a scalar tag
    pub fn scalar(tag: &str) -> IdlType {
        match tag {
            "bool" => IdlType::Bool,
            "u8" => IdlType::U8,
            "i8" => IdlType::I8,
            "u16" => IdlType::U16,
            "i16" => IdlType::I16,
            "u32" => IdlType::U32,
            "i32" => IdlType::I32,
            "u64" => IdlType::U64,
            "i64" => IdlType::I64,
            "u128" => IdlType::U128,
            "i128" => IdlType::I128,
            "bytes" => IdlType::Bytes,
            "string" => IdlType::String,
            "publicKey" | "pubkey" => IdlType::PublicKey,
            other => IdlType::Unknown(other.to_string()),
        }
    }

    fn from_object(obj: &Map<String, JsonValue>) -> Option<IdlType> {
        if obj.len() != 1 {
            return None;
        }
        let (key, inner) = obj.iter().next()?;
        match key.as_str() {
            "vec" => Some(IdlType::Vec(Box::new(IdlType::from(inner.clone())))),
            "option" => Some(IdlType::Option(Box::new(IdlType::from(inner.clone())))),
            "array" => {
                let pair = inner.as_array()?;
                if pair.len() != 2 {
                    return None;
                }
                let len = usize::try_from(pair[1].as_u64()?).ok()?;
                Some(IdlType::Array(Box::new(IdlType::from(pair[0].clone())), len))
            }
            "defined" => match inner {
                JsonValue::String(name) => Some(IdlType::Defined(name.clone())),
                JsonValue::Object(def) => {
                    let has_generics = def
                        .get("generics")
                        .and_then(|g| g.as_array())
                        .map(|g| !g.is_empty())
                        .unwrap_or(false);
                    if has_generics {
                        return None;
                    }
                    let name = def.get("name")?.as_str()?;
                    Some(IdlType::Defined(name.to_string()))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<JsonValue> for IdlType {
    fn from(value: JsonValue) -> Self {
        match &value {
            JsonValue::String(tag) => IdlType::scalar(tag),
            JsonValue::Object(obj) => {
                IdlType::from_object(obj).unwrap_or(IdlType::Unrecognized(value))
            }
            _ => IdlType::Unrecognized(value),
        }
    }
}

impl From<IdlType> for JsonValue {
    fn from(ty: IdlType) -> Self {
        match ty {
            IdlType::Vec(inner) => json!({ "vec": JsonValue::from(*inner) }),
            IdlType::Option(inner) => json!({ "option": JsonValue::from(*inner) }),
            IdlType::Array(inner, len) => json!({ "array": [JsonValue::from(*inner), len] }),
            IdlType::Defined(name) => json!({ "defined": name }),
            IdlType::Unknown(tag) => JsonValue::String(tag),
            IdlType::Unrecognized(raw) => raw,
            scalar => JsonValue::String(scalar.to_string()),
        }
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IdlType::Bool => write!(f, "bool"),
            IdlType::U8 => write!(f, "u8"),
            IdlType::I8 => write!(f, "i8"),
            IdlType::U16 => write!(f, "u16"),
            IdlType::I16 => write!(f, "i16"),
            IdlType::U32 => write!(f, "u32"),
            IdlType::I32 => write!(f, "i32"),
            IdlType::U64 => write!(f, "u64"),
            IdlType::I64 => write!(f, "i64"),
            IdlType::U128 => write!(f, "u128"),
            IdlType::I128 => write!(f, "i128"),
            IdlType::Bytes => write!(f, "bytes"),
            IdlType::String => write!(f, "string"),
            IdlType::PublicKey => write!(f, "publicKey"),
            IdlType::Vec(inner) => write!(f, "Vec<{}>", inner),
            IdlType::Option(inner) => write!(f, "Option<{}>", inner),
            IdlType::Array(inner, len) => write!(f, "Array<{}; {}>", inner, len),
            IdlType::Defined(name) => write!(f, "{}", name),
            IdlType::Unknown(tag) => write!(f, "{}", tag),
            IdlType::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

impl Idl {
    /// Parse IDL from JSON string
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::IdlParse(e.to_string()))
    }

    /// Serialize the IDL to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::IdlParse(e.to_string()))
    }

    /// Catalog used to resolve `defined` references: every custom type, plus
    /// account types that are not also declared under `types`
    pub fn catalog(&self) -> Vec<IdlTypeDef> {
        let mut catalog = self.types.clone();
        for account in &self.accounts {
            if !self.types.iter().any(|t| t.name == account.name) {
                catalog.push(account.clone());
            }
        }
        catalog
    }

    /// Look up instruction by name
    pub fn find_instruction(&self, name: &str) -> Option<&IdlInstruction> {
        self.instructions.iter().find(|i| i.name == name)
    }

    /// Look up account by name
    pub fn find_account(&self, name: &str) -> Option<&IdlTypeDef> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Look up a custom type by name
    pub fn find_type(&self, name: &str) -> Option<&IdlTypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Look up event by name
    pub fn find_event(&self, name: &str) -> Option<&IdlEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Look up error by code
    pub fn find_error(&self, code: u32) -> Option<&IdlErrorCode> {
        self.errors.iter().find(|e| e.code == code)
    }

    /// Program-specific error table: code to message, falling back to the
    /// error name when no message was declared
    pub fn error_messages(&self) -> HashMap<u32, String> {
        self.errors
            .iter()
            .map(|e| (e.code, e.msg.clone().unwrap_or_else(|| e.name.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_idl() {
        let json = r#"{
            "name": "test_program",
            "version": "1.0.0",
            "instructions": []
        }"#;

        let idl = Idl::parse(json).unwrap();
        assert_eq!(idl.name, "test_program");
        assert_eq!(idl.version, "1.0.0");
        assert!(idl.state.is_none());
        assert!(idl.events.is_empty());
    }

    #[test]
    fn test_parse_type_expressions() {
        let ty: IdlType = serde_json::from_str(r#"{"vec": {"option": {"defined": "Side"}}}"#).unwrap();
        assert_eq!(
            ty,
            IdlType::Vec(Box::new(IdlType::Option(Box::new(IdlType::Defined(
                "Side".to_string()
            )))))
        );

        let ty: IdlType = serde_json::from_str(r#"{"array": ["u8", 32]}"#).unwrap();
        assert_eq!(ty, IdlType::Array(Box::new(IdlType::U8), 32));

        let ty: IdlType = serde_json::from_str(r#"{"defined": {"name": "Pool"}}"#).unwrap();
        assert_eq!(ty, IdlType::Defined("Pool".to_string()));

        let ty: IdlType = serde_json::from_str(r#""pubkey""#).unwrap();
        assert_eq!(ty, IdlType::PublicKey);
    }

    #[test]
    fn test_unknown_shapes_are_preserved() {
        let ty: IdlType = serde_json::from_str(r#""f64""#).unwrap();
        assert_eq!(ty, IdlType::Unknown("f64".to_string()));

        let ty: IdlType = serde_json::from_str(r#"{"coption": "u64"}"#).unwrap();
        assert!(matches!(ty, IdlType::Unrecognized(_)));
    }

    #[test]
    fn test_type_json_round_trip() {
        let ty = IdlType::Vec(Box::new(IdlType::Array(Box::new(IdlType::PublicKey), 4)));
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, r#"{"vec":{"array":["publicKey",4]}}"#);
    }

    #[test]
    fn test_enum_variant_shapes() {
        let json = r#"{
            "name": "Action",
            "type": {
                "kind": "enum",
                "variants": [
                    {"name": "Idle"},
                    {"name": "Move", "fields": [{"name": "dx", "type": "i16"}]},
                    {"name": "Pair", "fields": ["u8", "u8"]}
                ]
            }
        }"#;
        let def: IdlTypeDef = serde_json::from_str(json).unwrap();
        let IdlTypeDefTy::Enum { variants } = def.ty else {
            panic!("expected enum");
        };
        assert!(variants[0].fields.is_none());
        assert!(matches!(variants[1].fields, Some(EnumFields::Named(_))));
        assert!(matches!(variants[2].fields, Some(EnumFields::Tuple(_))));
    }

    #[test]
    fn test_nested_account_groups() {
        let json = r#"{
            "name": "p",
            "instructions": [{
                "name": "initialize",
                "accounts": [
                    {"name": "authority", "isMut": false, "isSigner": true},
                    {"name": "pool", "accounts": [
                        {"name": "vault", "isMut": true, "isSigner": false}
                    ]}
                ],
                "args": [{"name": "amount", "type": "u64"}]
            }]
        }"#;
        let idl = Idl::parse(json).unwrap();
        let ix = idl.find_instruction("initialize").unwrap();
        assert!(matches!(ix.accounts[0], IdlAccountItem::Account(_)));
        assert!(matches!(ix.accounts[1], IdlAccountItem::Accounts(_)));
    }

    #[test]
    fn test_error_messages_fall_back_to_name() {
        let json = r#"{
            "name": "p",
            "errors": [
                {"code": 6000, "name": "Hello", "msg": "custom msg"},
                {"code": 6001, "name": "NoMessage"}
            ]
        }"#;
        let idl = Idl::parse(json).unwrap();
        let table = idl.error_messages();
        assert_eq!(table[&6000], "custom msg");
        assert_eq!(table[&6001], "NoMessage");
    }
}
