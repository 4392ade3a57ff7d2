//! # Discriminators
//!
//! Every framed payload starts with 8 bytes that identify what follows:
//! the first 8 bytes of `SHA-256("{namespace}:{name}")`.
//!
//! | Payload | Preimage |
//! |---|---|
//! | instruction | `global:<snake_case name>` |
//! | legacy state method | `state:<snake_case name>` |
//! | account | `account:<PascalCase name>` |
//! | event | `event:<name>` |
//!
//! Discriminators are pure functions of their input. Consumers persist and
//! compare them, so the preimage format must never change.

use heck::ToSnakeCase;
use sha2::{Digest, Sha256};

/// Length of every discriminator and sighash
pub const DISCRIMINATOR_SIZE: usize = 8;

/// Namespace for instruction sighashes
pub const SIGHASH_GLOBAL_NAMESPACE: &str = "global";

/// Namespace for legacy state method sighashes
pub const SIGHASH_STATE_NAMESPACE: &str = "state";

/// Namespace for account discriminators
pub const ACCOUNT_NAMESPACE: &str = "account";

/// Namespace for event discriminators
pub const EVENT_NAMESPACE: &str = "event";

/// Tag prefixed to events emitted through a self-CPI
pub const EVENT_IX_TAG: u64 = 0x1d9acb512ea545e4;

/// [`EVENT_IX_TAG`] as it appears in instruction data
pub const EVENT_IX_TAG_LE: [u8; DISCRIMINATOR_SIZE] = EVENT_IX_TAG.to_le_bytes();

/// 8-byte payload identifier
pub type Discriminator = [u8; DISCRIMINATOR_SIZE];

/// First 8 bytes of `SHA-256("{namespace}:{name}")`; `name` is hashed as given
pub fn discriminator(namespace: &str, name: &str) -> Discriminator {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();

    let mut out = [0u8; DISCRIMINATOR_SIZE];
    out.copy_from_slice(&hash[..DISCRIMINATOR_SIZE]);
    out
}

/// Instruction selector. The name is snake_cased first, so `initializeState`
/// and `initialize_state` produce the same sighash.
pub fn sighash(namespace: &str, ix_name: &str) -> Discriminator {
    discriminator(namespace, &to_snake_case(ix_name))
}

/// Account discriminator for an account type name
pub fn account_discriminator(name: &str) -> Discriminator {
    discriminator(ACCOUNT_NAMESPACE, &to_pascal_case(name))
}

/// Event discriminator (name is used verbatim)
pub fn event_discriminator(name: &str) -> Discriminator {
    discriminator(EVENT_NAMESPACE, name)
}

/// Sighash for a legacy state method
pub fn state_sighash(method: &str) -> Discriminator {
    sighash(SIGHASH_STATE_NAMESPACE, method)
}

/// `initializeState` -> `initialize_state`, `getV2Price` -> `get_v2_price`
pub fn to_snake_case(s: &str) -> String {
    s.to_snake_case()
}

/// `data_account` -> `DataAccount`.
///
/// Only the first letter of each `_`, `-` or space separated segment is
/// raised; inner capitals are kept, so `NFTData` hashes as `NFTData` and not
/// as heck's `NftData`.
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for segment in s.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_discriminators() {
        assert_eq!(
            sighash(SIGHASH_GLOBAL_NAMESPACE, "initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
        assert_eq!(
            account_discriminator("DataAccount"),
            [85, 240, 182, 158, 76, 7, 18, 233]
        );
        assert_eq!(
            event_discriminator("MyEvent"),
            [96, 184, 197, 243, 139, 2, 90, 148]
        );
        assert_eq!(state_sighash("new"), [162, 234, 162, 24, 168, 43, 50, 226]);
    }

    #[test]
    fn test_sighash_normalizes_case() {
        assert_eq!(
            sighash(SIGHASH_GLOBAL_NAMESPACE, "initializeState"),
            sighash(SIGHASH_GLOBAL_NAMESPACE, "initialize_state")
        );
        assert_eq!(
            hex::encode(sighash(SIGHASH_GLOBAL_NAMESPACE, "initializeState")),
            "beabe0dbd948c7b0"
        );
    }

    #[test]
    fn test_event_ix_tag_bytes() {
        assert_eq!(hex::encode(EVENT_IX_TAG_LE), "e445a52e51cb9a1d");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("initialize"), "initialize");
        assert_eq!(to_snake_case("initializeState"), "initialize_state");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("v2Swap"), "v2_swap");
    }

    #[test]
    fn test_snake_case_digits_and_acronyms() {
        assert_eq!(to_snake_case("getV2Price"), "get_v2_price");
        assert_eq!(to_snake_case("mintTo2022"), "mint_to2022");
        assert_eq!(to_snake_case("setFeeBPS"), "set_fee_bps");
        assert_eq!(
            sighash(SIGHASH_GLOBAL_NAMESPACE, "getV2Price"),
            discriminator(SIGHASH_GLOBAL_NAMESPACE, "get_v2_price")
        );
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("dataAccount"), "DataAccount");
        assert_eq!(to_pascal_case("data_account"), "DataAccount");
        assert_eq!(to_pascal_case("DataAccount"), "DataAccount");
        assert_eq!(to_pascal_case("NFTData"), "NFTData");
        assert_eq!(to_pascal_case("user-book"), "UserBook");
    }
}
