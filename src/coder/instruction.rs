//! Instruction codec: `8-byte sighash ++ args struct`
//!
//! Instructions live in the `global` sighash namespace. Methods of the legacy
//! `state` section are hashed under `state` and encoded with
//! [`InstructionCoder::encode_state`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::discriminator::{
    sighash, to_snake_case, Discriminator, DISCRIMINATOR_SIZE, SIGHASH_GLOBAL_NAMESPACE,
    SIGHASH_STATE_NAMESPACE,
};
use super::layout::{compile_fields, Layout};
use crate::error::{Error, Result};
use crate::idl::{Idl, IdlAccountItem, IdlInstruction, IdlTypeDef};
use crate::value::Value;
use solana_sdk::pubkey::Pubkey;

/// Text encoding of serialized instruction data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Hex,
    Base58,
}

/// Decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Instruction (or state method) name as declared in the IDL
    pub name: String,
    /// Decoded argument struct
    pub data: Value,
}

/// Account passed to an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Rendered instruction argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDisplay {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub data: String,
}

/// Rendered instruction account; remaining accounts have no name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDisplay {
    pub name: Option<String>,
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Human readable view of an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDisplay {
    pub args: Vec<ArgDisplay>,
    pub accounts: Vec<AccountDisplay>,
}

#[derive(Debug, Clone)]
struct IxEntry {
    name: String,
    layout: Layout,
}

/// Encodes and decodes instruction data for one IDL
#[derive(Debug, Clone)]
pub struct InstructionCoder {
    /// Layouts keyed by snake_case name, so `initializeMarket` and
    /// `initialize_market` select the same instruction
    global: HashMap<String, Layout>,
    state: HashMap<String, Layout>,
    /// Sighash to instruction, across both namespaces
    by_sighash: HashMap<Discriminator, IxEntry>,
    instructions: Vec<IdlInstruction>,
    types: Vec<IdlTypeDef>,
}

fn build_layouts(
    methods: &[IdlInstruction],
    namespace: &str,
    catalog: &[IdlTypeDef],
    by_sighash: &mut HashMap<Discriminator, IxEntry>,
) -> Result<HashMap<String, Layout>> {
    let mut layouts = HashMap::with_capacity(methods.len());
    for ix in methods {
        let layout = compile_fields(&ix.args, catalog)?;
        by_sighash.insert(
            sighash(namespace, &ix.name),
            IxEntry {
                name: ix.name.clone(),
                layout: layout.clone(),
            },
        );
        layouts.insert(to_snake_case(&ix.name), layout);
    }
    Ok(layouts)
}

impl InstructionCoder {
    pub fn new(idl: &Idl) -> Result<Self> {
        let catalog = idl.catalog();
        let mut by_sighash = HashMap::new();

        let state_methods = idl
            .state
            .as_ref()
            .map(|s| s.methods.as_slice())
            .unwrap_or_default();
        let state = build_layouts(
            state_methods,
            SIGHASH_STATE_NAMESPACE,
            &catalog,
            &mut by_sighash,
        )?;
        let global = build_layouts(
            &idl.instructions,
            SIGHASH_GLOBAL_NAMESPACE,
            &catalog,
            &mut by_sighash,
        )?;

        Ok(Self {
            global,
            state,
            by_sighash,
            instructions: idl.instructions.clone(),
            types: catalog,
        })
    }

    /// Number of instructions and state methods
    pub fn len(&self) -> usize {
        self.global.len() + self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes a global instruction
    pub fn encode(&self, ix_name: &str, args: &Value) -> Result<Vec<u8>> {
        Self::encode_in(&self.global, SIGHASH_GLOBAL_NAMESPACE, ix_name, args)
    }

    /// Encodes a legacy state method
    pub fn encode_state(&self, ix_name: &str, args: &Value) -> Result<Vec<u8>> {
        Self::encode_in(&self.state, SIGHASH_STATE_NAMESPACE, ix_name, args)
    }

    fn encode_in(
        layouts: &HashMap<String, Layout>,
        namespace: &str,
        ix_name: &str,
        args: &Value,
    ) -> Result<Vec<u8>> {
        let layout = layouts.get(&to_snake_case(ix_name)).ok_or_else(|| Error::UnknownName {
            kind: "instruction",
            name: ix_name.to_string(),
        })?;
        let mut out = sighash(namespace, ix_name).to_vec();
        layout.encode(args, &mut out)?;
        Ok(out)
    }

    /// Routes `data` by its sighash. `Ok(None)` when no instruction matches.
    pub fn decode(&self, data: &[u8]) -> Result<Option<Instruction>> {
        let Some(prefix) = data.get(..DISCRIMINATOR_SIZE) else {
            return Ok(None);
        };
        let mut key = [0u8; DISCRIMINATOR_SIZE];
        key.copy_from_slice(prefix);

        match self.by_sighash.get(&key) {
            Some(entry) => Ok(Some(Instruction {
                name: entry.name.clone(),
                data: entry.layout.decode(&data[DISCRIMINATOR_SIZE..])?,
            })),
            None => Ok(None),
        }
    }

    /// Decodes hex or base58 encoded instruction data
    pub fn decode_str(&self, data: &str, encoding: Encoding) -> Result<Option<Instruction>> {
        let bytes = match encoding {
            Encoding::Hex => hex::decode(data)
                .map_err(|e| Error::invalid_data(format!("invalid hex: {}", e)))?,
            Encoding::Base58 => bs58::decode(data)
                .into_vec()
                .map_err(|e| Error::invalid_data(format!("invalid base58: {}", e)))?,
        };
        self.decode(&bytes)
    }

    /// Labels the arguments and accounts of a decoded global instruction
    pub fn format(&self, ix: &Instruction, metas: &[AccountMeta]) -> Result<InstructionDisplay> {
        let key = to_snake_case(&ix.name);
        let idl_ix = self
            .instructions
            .iter()
            .find(|i| to_snake_case(&i.name) == key)
            .ok_or_else(|| Error::UnknownName {
                kind: "instruction",
                name: ix.name.clone(),
            })?;

        let args = idl_ix
            .args
            .iter()
            .map(|arg| {
                Ok(ArgDisplay {
                    name: arg.name.clone(),
                    ty: arg.ty.to_string(),
                    data: ix.data.field(&arg.name)?.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut names = Vec::new();
        flatten_accounts(&idl_ix.accounts, None, &mut names);

        let accounts = metas
            .iter()
            .enumerate()
            .map(|(i, meta)| AccountDisplay {
                name: names.get(i).cloned(),
                pubkey: meta.pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
            .collect();

        Ok(InstructionDisplay { args, accounts })
    }

    /// Type catalog the instruction layouts were compiled against
    pub fn types(&self) -> &[IdlTypeDef] {
        &self.types
    }
}

/// Depth-first account labels; nested groups render as `Group > Member`
fn flatten_accounts(items: &[IdlAccountItem], prefix: Option<&str>, out: &mut Vec<String>) {
    for item in items {
        let (name, nested) = match item {
            IdlAccountItem::Account(acc) => (&acc.name, None),
            IdlAccountItem::Accounts(group) => (&group.name, Some(&group.accounts)),
        };
        let label = match prefix {
            Some(p) => format!("{} > {}", p, sentence_case(name)),
            None => sentence_case(name),
        };
        match nested {
            Some(members) => flatten_accounts(members, Some(&label), out),
            None => out.push(label),
        }
    }
}

/// `tokenProgram` -> `Token Program`
fn sentence_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            if c.is_uppercase() {
                out.push(' ');
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDL: &str = r#"{
        "name": "vault",
        "instructions": [
            {
                "name": "deposit",
                "accounts": [
                    {"name": "owner", "isMut": false, "isSigner": true},
                    {"name": "pool", "accounts": [
                        {"name": "vaultAccount", "isMut": true, "isSigner": false}
                    ]}
                ],
                "args": [
                    {"name": "amount", "type": "u64"},
                    {"name": "memo", "type": {"option": "string"}}
                ]
            }
        ],
        "state": {
            "struct": {"name": "Config", "type": {"kind": "struct", "fields": []}},
            "methods": [
                {"name": "setFee", "accounts": [], "args": [{"name": "bps", "type": "u16"}]}
            ]
        }
    }"#;

    fn deposit_args() -> Value {
        Value::structure([
            ("amount", Value::U64(1_000)),
            ("memo", Value::some(Value::String("hi".into()))),
        ])
    }

    #[test]
    fn test_encode_decode_global() {
        let coder = InstructionCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let data = coder.encode("deposit", &deposit_args()).unwrap();
        assert_eq!(&data[..8], &sighash(SIGHASH_GLOBAL_NAMESPACE, "deposit"));

        let ix = coder.decode(&data).unwrap().unwrap();
        assert_eq!(ix.name, "deposit");
        assert_eq!(ix.data, deposit_args());

        let hex_ix = coder.decode_str(&hex::encode(&data), Encoding::Hex).unwrap();
        assert_eq!(hex_ix, Some(ix.clone()));
        let b58_ix = coder
            .decode_str(&bs58::encode(&data).into_string(), Encoding::Base58)
            .unwrap();
        assert_eq!(b58_ix, Some(ix));
    }

    #[test]
    fn test_state_namespace() {
        let coder = InstructionCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let args = Value::structure([("bps", Value::U16(30))]);
        let data = coder.encode_state("setFee", &args).unwrap();
        assert_eq!(&data[..8], &sighash(SIGHASH_STATE_NAMESPACE, "set_fee"));
        assert_eq!(coder.decode(&data).unwrap().unwrap().name, "setFee");
        assert!(coder.encode("setFee", &args).is_err());
    }

    #[test]
    fn test_encode_accepts_either_casing() {
        let coder = InstructionCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let args = Value::structure([("bps", Value::U16(30))]);
        assert_eq!(
            coder.encode_state("set_fee", &args).unwrap(),
            coder.encode_state("setFee", &args).unwrap()
        );
        assert_eq!(
            coder.encode_state("SetFee", &args).unwrap(),
            coder.encode_state("setFee", &args).unwrap()
        );

        let err = coder.encode("withdraw_all", &args).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownName {
                kind: "instruction",
                name: "withdraw_all".to_string()
            }
        );
    }

    #[test]
    fn test_unmatched_sighash() {
        let coder = InstructionCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        assert_eq!(coder.decode(&[0u8; 12]).unwrap(), None);
        assert_eq!(coder.decode(&[1, 2]).unwrap(), None);
    }

    #[test]
    fn test_format() {
        let coder = InstructionCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let data = coder.encode("deposit", &deposit_args()).unwrap();
        let ix = coder.decode(&data).unwrap().unwrap();

        let meta = |b: u8| AccountMeta {
            pubkey: Pubkey::new_from_array([b; 32]),
            is_signer: false,
            is_writable: false,
        };
        let display = coder.format(&ix, &[meta(1), meta(2), meta(3)]).unwrap();

        assert_eq!(display.args[0].ty, "u64");
        assert_eq!(display.args[0].data, "1000");
        assert_eq!(display.args[1].ty, "Option<string>");
        assert_eq!(display.args[1].data, "\"hi\"");

        assert_eq!(display.accounts[0].name.as_deref(), Some("Owner"));
        assert_eq!(
            display.accounts[1].name.as_deref(),
            Some("Pool > Vault Account")
        );
        assert_eq!(display.accounts[2].name, None);
    }
}
