//! Account codec: `8-byte discriminator ++ body`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::discriminator::{account_discriminator, Discriminator, DISCRIMINATOR_SIZE};
use super::layout::{compile_type_def, Layout};
use crate::error::{Error, Result};
use crate::idl::{Idl, IdlTypeDef};
use crate::options::{CoderOptions, DiscriminatorCheck};
use crate::value::Value;

/// Number of bytes of the account discriminator
pub const ACCOUNT_DISCRIMINATOR_SIZE: usize = DISCRIMINATOR_SIZE;

/// RPC `memcmp` account filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemcmpFilter {
    /// Byte offset into account data
    pub offset: usize,
    /// Base58 encoded bytes to compare
    pub bytes: String,
}

#[derive(Debug, Clone)]
struct AccountEntry {
    discriminator: Discriminator,
    layout: Layout,
}

/// Encodes and decodes account data for every account of one IDL
#[derive(Debug, Clone)]
pub struct AccountsCoder {
    accounts: HashMap<String, AccountEntry>,
    /// Declaration order, used by [`AccountsCoder::decode_any`]
    order: Vec<String>,
    options: CoderOptions,
}

impl AccountsCoder {
    /// Builds layouts for every account (and the legacy state account, if any)
    pub fn new(idl: &Idl, options: CoderOptions) -> Result<Self> {
        let catalog = idl.catalog();
        let mut coder = Self {
            accounts: HashMap::new(),
            order: Vec::new(),
            options,
        };

        for def in &idl.accounts {
            coder.insert(def, &catalog)?;
        }
        if let Some(state) = &idl.state {
            if !coder.accounts.contains_key(&state.strct.name) {
                coder.insert(&state.strct, &catalog)?;
            }
        }
        Ok(coder)
    }

    fn insert(&mut self, def: &IdlTypeDef, catalog: &[IdlTypeDef]) -> Result<()> {
        let entry = AccountEntry {
            discriminator: account_discriminator(&def.name),
            layout: compile_type_def(def, catalog)?,
        };
        if self.accounts.insert(def.name.clone(), entry).is_none() {
            self.order.push(def.name.clone());
        }
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&AccountEntry> {
        self.accounts.get(name).ok_or_else(|| Error::UnknownName {
            kind: "account",
            name: name.to_string(),
        })
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Encodes `value` as account data, discriminator included
    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let entry = self.entry(name)?;
        let mut out = Vec::with_capacity(
            ACCOUNT_DISCRIMINATOR_SIZE + entry.layout.fixed_size().unwrap_or(64),
        );
        out.extend_from_slice(&entry.discriminator);
        entry.layout.encode(value, &mut out)?;
        Ok(out)
    }

    /// Decodes account data according to the configured [`DiscriminatorCheck`]
    pub fn decode(&self, name: &str, data: &[u8]) -> Result<Value> {
        match self.options.account_check {
            DiscriminatorCheck::Unchecked => self.decode_unchecked(name, data),
            DiscriminatorCheck::Checked => self.decode_checked(name, data),
        }
    }

    /// Strips the first 8 bytes without inspecting them and decodes the rest
    pub fn decode_unchecked(&self, name: &str, data: &[u8]) -> Result<Value> {
        let entry = self.entry(name)?;
        let body = data
            .get(ACCOUNT_DISCRIMINATOR_SIZE..)
            .ok_or(Error::BufferUnderrun {
                needed: ACCOUNT_DISCRIMINATOR_SIZE,
                remaining: data.len(),
            })?;
        entry.layout.decode(body)
    }

    /// Like [`AccountsCoder::decode_unchecked`], but the prefix must be the
    /// account's discriminator
    pub fn decode_checked(&self, name: &str, data: &[u8]) -> Result<Value> {
        let entry = self.entry(name)?;
        if data.get(..ACCOUNT_DISCRIMINATOR_SIZE) != Some(&entry.discriminator[..]) {
            return Err(Error::DiscriminatorMismatch {
                name: name.to_string(),
            });
        }
        entry.layout.decode(&data[ACCOUNT_DISCRIMINATOR_SIZE..])
    }

    /// Identifies the account type by its prefix and decodes it.
    /// Returns `Ok(None)` when no registered account matches.
    pub fn decode_any(&self, data: &[u8]) -> Result<Option<(String, Value)>> {
        let Some(prefix) = data.get(..ACCOUNT_DISCRIMINATOR_SIZE) else {
            return Ok(None);
        };
        for name in &self.order {
            let entry = self.entry(name)?;
            if entry.discriminator[..] == *prefix {
                let value = entry.layout.decode(&data[ACCOUNT_DISCRIMINATOR_SIZE..])?;
                return Ok(Some((name.clone(), value)));
            }
        }
        Ok(None)
    }

    /// Filter matching accounts of type `name`, optionally extended with
    /// further bytes that must follow the discriminator
    pub fn memcmp(&self, name: &str, append: Option<&[u8]>) -> Result<MemcmpFilter> {
        let entry = self.entry(name)?;
        let mut bytes = entry.discriminator.to_vec();
        if let Some(extra) = append {
            bytes.extend_from_slice(extra);
        }
        Ok(MemcmpFilter {
            offset: 0,
            bytes: bs58::encode(bytes).into_string(),
        })
    }

    /// Exact size of the account data (discriminator included), or `None`
    /// when the account contains variable-length fields
    pub fn size(&self, name: &str) -> Result<Option<usize>> {
        let entry = self.entry(name)?;
        Ok(entry
            .layout
            .fixed_size()
            .and_then(|body| body.checked_add(ACCOUNT_DISCRIMINATOR_SIZE)))
    }

    /// Discriminator of a registered account
    pub fn discriminator(&self, name: &str) -> Result<Discriminator> {
        Ok(self.entry(name)?.discriminator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDL: &str = r#"{
        "name": "counter",
        "instructions": [],
        "accounts": [
            {"name": "Counter", "type": {"kind": "struct", "fields": [
                {"name": "authority", "type": "publicKey"},
                {"name": "count", "type": "u64"}
            ]}},
            {"name": "Profile", "type": {"kind": "struct", "fields": [
                {"name": "handle", "type": "string"}
            ]}}
        ]
    }"#;

    fn counter() -> Value {
        Value::structure([
            ("authority", Value::PublicKey(Default::default())),
            ("count", Value::U64(9)),
        ])
    }

    #[test]
    fn test_encode_prefixes_discriminator() {
        let idl = Idl::parse(IDL).unwrap();
        let coder = AccountsCoder::new(&idl, CoderOptions::default()).unwrap();
        let data = coder.encode("Counter", &counter()).unwrap();
        assert_eq!(&data[..8], &account_discriminator("Counter"));
        assert_eq!(data.len(), 8 + 32 + 8);
        assert_eq!(coder.decode("Counter", &data).unwrap(), counter());
    }

    #[test]
    fn test_unchecked_decode_ignores_prefix() {
        let idl = Idl::parse(IDL).unwrap();
        let coder = AccountsCoder::new(&idl, CoderOptions::default()).unwrap();
        let mut data = coder.encode("Counter", &counter()).unwrap();
        data[..8].copy_from_slice(&[0u8; 8]);

        assert_eq!(coder.decode("Counter", &data).unwrap(), counter());
        assert_eq!(
            coder.decode_checked("Counter", &data),
            Err(Error::DiscriminatorMismatch {
                name: "Counter".to_string()
            })
        );

        let checked = AccountsCoder::new(&idl, CoderOptions::checked()).unwrap();
        assert!(checked.decode("Counter", &data).is_err());
    }

    #[test]
    fn test_decode_any() {
        let idl = Idl::parse(IDL).unwrap();
        let coder = AccountsCoder::new(&idl, CoderOptions::default()).unwrap();
        let profile = Value::structure([("handle", Value::String("ada".into()))]);
        let data = coder.encode("Profile", &profile).unwrap();

        let (name, value) = coder.decode_any(&data).unwrap().unwrap();
        assert_eq!(name, "Profile");
        assert_eq!(value, profile);
        assert!(coder.decode_any(&[0u8; 4]).unwrap().is_none());
    }

    #[test]
    fn test_size_and_memcmp() {
        let idl = Idl::parse(IDL).unwrap();
        let coder = AccountsCoder::new(&idl, CoderOptions::default()).unwrap();
        assert_eq!(coder.size("Counter").unwrap(), Some(48));
        assert_eq!(coder.size("Profile").unwrap(), None);

        let filter = coder.memcmp("Counter", None).unwrap();
        assert_eq!(filter.offset, 0);
        assert_eq!(
            bs58::decode(&filter.bytes).into_vec().unwrap(),
            account_discriminator("Counter").to_vec()
        );
    }

    #[test]
    fn test_unknown_account() {
        let idl = Idl::parse(IDL).unwrap();
        let coder = AccountsCoder::new(&idl, CoderOptions::default()).unwrap();
        assert_eq!(
            coder.decode("Missing", &[0u8; 16]),
            Err(Error::UnknownName {
                kind: "account",
                name: "Missing".to_string()
            })
        );
    }
}
