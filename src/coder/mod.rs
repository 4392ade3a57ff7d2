//! # IDL Coders
//!
//! Everything needed to move typed [`Value`](crate::Value)s across the wire
//! for one program, built once from its [`Idl`] and read-only afterwards.
//!
//! ## Example
//!
//! ```rust,ignore
//! use idlcoder::{Coder, CoderOptions, Idl, Value};
//!
//! let idl = Idl::parse(&std::fs::read_to_string("counter.json")?)?;
//! let coder = Coder::new(&idl, CoderOptions::default())?;
//!
//! let data = coder.instruction.encode("increment", &Value::structure([("by", Value::U64(1))]))?;
//! let ix = coder.instruction.decode(&data)?;
//! ```
//!
//! A `Coder` holds no interior mutability and is `Send + Sync`; share it by
//! reference (or `Arc`) across threads.

pub mod accounts;
pub mod discriminator;
pub mod event;
pub mod instruction;
pub mod layout;
pub mod types;

pub use accounts::{AccountsCoder, MemcmpFilter, ACCOUNT_DISCRIMINATOR_SIZE};
pub use discriminator::{
    account_discriminator, discriminator, event_discriminator, sighash, state_sighash,
    to_pascal_case, to_snake_case, Discriminator, DISCRIMINATOR_SIZE, EVENT_IX_TAG,
    EVENT_IX_TAG_LE, SIGHASH_GLOBAL_NAMESPACE, SIGHASH_STATE_NAMESPACE,
};
pub use event::{Event, EventCoder};
pub use instruction::{
    AccountDisplay, AccountMeta, ArgDisplay, Encoding, Instruction, InstructionCoder,
    InstructionDisplay,
};
pub use layout::{compile_field, compile_fields, compile_type_def, Layout};
pub use types::TypesCoder;

use tracing::debug;

use crate::error::Result;
use crate::idl::Idl;
use crate::options::CoderOptions;

/// All codecs of one program
#[derive(Debug, Clone)]
pub struct Coder {
    pub instruction: InstructionCoder,
    pub accounts: AccountsCoder,
    pub events: EventCoder,
    pub types: TypesCoder,
}

impl Coder {
    /// Compiles every layout in `idl`. Fails on the first type that cannot
    /// be compiled.
    pub fn new(idl: &Idl, options: CoderOptions) -> Result<Self> {
        let coder = Self {
            instruction: InstructionCoder::new(idl)?,
            accounts: AccountsCoder::new(idl, options)?,
            events: EventCoder::new(idl)?,
            types: TypesCoder::new(idl)?,
        };
        debug!(
            program = %idl.name,
            instructions = coder.instruction.len(),
            accounts = coder.accounts.len(),
            events = coder.events.len(),
            types = coder.types.len(),
            "Built IDL coder"
        );
        Ok(coder)
    }
}
