//! # idlcoder - IDL-driven codecs and log interpretation for Solana programs
//!
//! Given a program's Anchor-style IDL, this crate:
//!
//! - compiles every declared type into a byte-exact Borsh layout,
//! - frames accounts, instructions and events with their 8-byte
//!   discriminators,
//! - replays a transaction's log lines to find out which program emitted
//!   each line, so events and structured errors raised across CPI
//!   boundaries are attributed to the right program.
//!
//! Transport (RPC, signing, submission) is out of scope: logs come in as
//! plain strings and encoded bytes go out as `Vec<u8>`.
//!
//! ## Quick Start
//!
//! ```rust
//! use idlcoder::{Coder, CoderOptions, EventParser, Idl, Value};
//!
//! # fn main() -> idlcoder::Result<()> {
//! let idl = Idl::parse(r#"{
//!     "version": "0.1.0",
//!     "name": "counter",
//!     "instructions": [
//!         {"name": "increment", "accounts": [], "args": [{"name": "by", "type": "u64"}]}
//!     ],
//!     "events": [
//!         {"name": "Incremented", "fields": [{"name": "total", "type": "u64", "index": false}]}
//!     ]
//! }"#)?;
//! let coder = Coder::new(&idl, CoderOptions::default())?;
//!
//! // Instruction data: sighash ++ borsh(args)
//! let args = Value::structure([("by", Value::U64(5))]);
//! let data = coder.instruction.encode("increment", &args)?;
//! assert_eq!(data.len(), 8 + 8);
//!
//! // Events from logs
//! let payload = coder.events.encode("Incremented", &Value::structure([("total", Value::U64(5))]))?;
//! let logs = vec![
//!     "Program Counter111 invoke [1]".to_string(),
//!     format!("Program data: {}", payload),
//!     "Program Counter111 consumed 1200 of 200000 compute units".to_string(),
//!     "Program Counter111 success".to_string(),
//! ];
//! let events = EventParser::new("Counter111", &coder.events).parse_events(&logs)?;
//! assert_eq!(events[0].name, "Incremented");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! IDL JSON → Idl → Coder (layouts, built once, read-only)
//!                    ├─ encode: Value → bytes
//!                    └─ decode: bytes → Value
//! logs → ExecutionTracker → EventParser / ErrorTranslator → Event / TranslatedError
//! ```
//!
//! ### Main Components
//!
//! - [`Idl`] - IDL document model
//! - [`Layout`] - compiled encoder/decoder for one type
//! - [`Coder`] - instruction, account, event and type codecs of one program
//! - [`ExecutionTracker`] - per-line executing-program tracking
//! - [`EventParser`] - typed events out of logs
//! - [`ErrorTranslator`] - typed errors out of failed transactions

/// Version of the idlcoder crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coder;
pub mod error;
pub mod idl;
pub mod options;
pub mod program;
pub mod value;

// Re-export main types
pub use coder::{
    AccountsCoder, Coder, Event, EventCoder, Instruction, InstructionCoder, Layout, TypesCoder,
};
pub use error::{Error, ErrorSeverity, Result};
pub use idl::{Idl, IdlType, IdlTypeDef};
pub use options::{CoderOptions, DiscriminatorCheck, ParseOptions};
pub use program::{
    AnchorError, ErrorTranslator, EventParser, ExecutionTracker, ProgramError, ProgramErrorStack,
    TranslatedError,
};
pub use solana_sdk::pubkey::Pubkey;
pub use value::Value;
