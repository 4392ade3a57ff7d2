//! Transaction-log interpretation: which program was executing, which
//! events it emitted and why it failed.

pub mod error;
pub mod event;
pub mod execution;
pub mod lang_errors;

pub use error::{
    parse_custom_code, translate_error, AnchorError, ComparedValues, ErrorCode, ErrorTranslator,
    Origin, ProgramError, TranslatedError, ANCHOR_ERROR_PREFIX,
};
pub use event::EventParser;
pub use execution::{
    attribute_logs, AttributedLine, ExecutionTracker, LogLine, ProgramErrorStack, PROGRAM_DATA,
    PROGRAM_LOG,
};
pub use lang_errors::{lang_error, LangError, ERROR_CODE_OFFSET, LANG_ERRORS};
