//! # Error Translation
//!
//! Turns a failed transaction (its error text and logs) into a typed error.
//!
//! Two sources are tried, in order:
//!
//! 1. A structured error line logged by the program:
//!    `Program log: AnchorError thrown in src/lib.rs:13. Error Code: Hello. Error Number: 6000. Error Message: ...`
//!    possibly followed by the two compared values of a failed `require_*!`.
//! 2. A bare custom error code in the transport error text
//!    (`custom program error: 0x1770` or `{"Custom":6000}`), resolved against
//!    the program's IDL errors and then the framework table.
//!
//! When neither matches, the original error is handed back untouched inside
//! [`TranslatedError::Untranslated`], together with the call stack recovered
//! from the logs.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::execution::{strip_tag, ProgramErrorStack, PROGRAM_LOG};
use super::lang_errors::lang_error;
use crate::error::{Error, Result};
use crate::idl::Idl;
use solana_sdk::pubkey::Pubkey;

/// Marker that starts every structured error line
pub const ANCHOR_ERROR_PREFIX: &str = "Program log: AnchorError";

lazy_static! {
    static ref FILE_LINE_RE: Regex = Regex::new(
        r"^Program log: AnchorError thrown in (.*):(\d*)\. Error Code: (.*)\. Error Number: (\d*)\. Error Message: (.*)$"
    )
    .unwrap();
    static ref ACCOUNT_NAME_RE: Regex = Regex::new(
        r"^Program log: AnchorError caused by account: (.*)\. Error Code: (.*)\. Error Number: (\d*)\. Error Message: (.*)$"
    )
    .unwrap();
    static ref NO_INFO_RE: Regex = Regex::new(
        r"^Program log: AnchorError occurred\. Error Code: (.*)\. Error Number: (\d*)\. Error Message: (.*)$"
    )
    .unwrap();
    static ref LOG_VALUE_RE: Regex = Regex::new(r"^Program log: (.*)$").unwrap();
    static ref INLINE_VALUE_RE: Regex = Regex::new(r"^Program log: (Left|Right): (.*)$").unwrap();
    static ref CUSTOM_JSON_RE: Regex = Regex::new(r#""Custom":([0-9]+)\}"#).unwrap();
}

/// Error name and number as logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: String,
    pub number: u32,
}

/// Where a structured error was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Source location of the `err!`/`require!` call
    FileLine { file: String, line: u32 },
    /// Account whose constraint failed
    Account(String),
}

/// The two sides of a failed comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparedValues {
    /// `require_keys_eq!` and friends log each key on its own line
    Pubkeys(Pubkey, Pubkey),
    /// Scalar comparisons log `Left: <v>` / `Right: <v>`
    Values(String, String),
}

impl ComparedValues {
    /// Both sides rendered as text
    pub fn rendered(&self) -> (String, String) {
        match self {
            ComparedValues::Pubkeys(l, r) => (l.to_string(), r.to_string()),
            ComparedValues::Values(l, r) => (l.clone(), r.clone()),
        }
    }
}

/// Structured error logged by a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorError {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub origin: Option<Origin>,
    pub compared_values: Option<ComparedValues>,
    /// The error line plus any compared-value lines that followed it
    pub error_logs: Vec<String>,
    /// Full transaction logs
    pub logs: Vec<String>,
    pub program_error_stack: ProgramErrorStack,
}

impl AnchorError {
    /// Parses the first structured error line in `logs`, if there is one
    pub fn parse<S: AsRef<str>>(logs: &[S]) -> Option<Self> {
        let logs: Vec<String> = logs.iter().map(|l| l.as_ref().to_string()).collect();
        let index = logs.iter().position(|l| l.starts_with(ANCHOR_ERROR_PREFIX))?;
        let error_line = logs[index].as_str();

        let (error_code, error_message, origin) = parse_error_line(error_line)?;

        let mut error_logs = vec![error_line.to_string()];
        let compared_values = parse_compared_values(&logs, index, &mut error_logs);

        Some(Self {
            error_code,
            error_message,
            origin,
            compared_values,
            error_logs,
            program_error_stack: ProgramErrorStack::parse(&logs),
            logs,
        })
    }

    /// The program that raised the error
    pub fn program(&self) -> Option<&Pubkey> {
        self.program_error_stack.failed_program()
    }
}

fn parse_number(s: &str) -> Option<u32> {
    s.parse().ok()
}

fn parse_error_line(line: &str) -> Option<(ErrorCode, String, Option<Origin>)> {
    if let Some(c) = FILE_LINE_RE.captures(line) {
        let origin = Origin::FileLine {
            file: c[1].to_string(),
            line: parse_number(&c[2])?,
        };
        let code = ErrorCode {
            code: c[3].to_string(),
            number: parse_number(&c[4])?,
        };
        return Some((code, c[5].to_string(), Some(origin)));
    }
    if let Some(c) = ACCOUNT_NAME_RE.captures(line) {
        let code = ErrorCode {
            code: c[2].to_string(),
            number: parse_number(&c[3])?,
        };
        return Some((code, c[4].to_string(), Some(Origin::Account(c[1].to_string()))));
    }
    if let Some(c) = NO_INFO_RE.captures(line) {
        let code = ErrorCode {
            code: c[1].to_string(),
            number: parse_number(&c[2])?,
        };
        return Some((code, c[3].to_string(), None));
    }
    None
}

fn parse_compared_values(
    logs: &[String],
    index: usize,
    error_logs: &mut Vec<String>,
) -> Option<ComparedValues> {
    let next = logs.get(index + 1)?;

    if next == "Program log: Left:" {
        let value_at = |i: usize| {
            logs.get(i)
                .and_then(|l| LOG_VALUE_RE.captures(l))
                .map(|c| c[1].to_string())
        };
        let left = value_at(index + 2)?;
        let right = value_at(index + 4)?;
        error_logs.extend(logs[index + 1..index + 5].iter().cloned());
        return Some(match (left.parse::<Pubkey>(), right.parse::<Pubkey>()) {
            (Ok(l), Ok(r)) => ComparedValues::Pubkeys(l, r),
            _ => ComparedValues::Values(left, right),
        });
    }

    if next.starts_with("Program log: Left:") {
        let value_at = |i: usize| {
            logs.get(i)
                .and_then(|l| INLINE_VALUE_RE.captures(l))
                .map(|c| c[2].to_string())
        };
        let left = value_at(index + 1)?;
        let right = value_at(index + 2)?;
        error_logs.extend(logs[index + 1..index + 3].iter().cloned());
        return Some(ComparedValues::Values(left, right));
    }

    None
}

impl fmt::Display for AnchorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let joined = self.error_logs.join("\n");
        write!(f, "{}", strip_tag(&joined, PROGRAM_LOG).unwrap_or(&joined))
    }
}

impl std::error::Error for AnchorError {}

/// Error identified only by its numeric code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramError {
    pub code: u32,
    pub msg: String,
    pub logs: Vec<String>,
    /// Present when logs were supplied
    pub program_error_stack: Option<ProgramErrorStack>,
}

impl ProgramError {
    /// Extracts a custom error code from `err` and resolves it against the
    /// program's errors, then the framework's
    pub fn parse<S: AsRef<str>>(
        err: &str,
        logs: &[S],
        idl_errors: &HashMap<u32, String>,
    ) -> Option<Self> {
        let code = parse_custom_code(err)?;
        let msg = match idl_errors.get(&code) {
            Some(msg) => msg.clone(),
            None => lang_error(code)?.msg.to_string(),
        };

        let logs: Vec<String> = logs.iter().map(|l| l.as_ref().to_string()).collect();
        let program_error_stack = (!logs.is_empty()).then(|| ProgramErrorStack::parse(&logs));
        Some(Self {
            code,
            msg,
            logs,
            program_error_stack,
        })
    }

    /// The program that raised the error, when logs were available
    pub fn program(&self) -> Option<&Pubkey> {
        self.program_error_stack.as_ref()?.failed_program()
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for ProgramError {}

/// Leading integer of `s`; `0x` selects hexadecimal. Trailing text is ignored.
fn parse_leading_int(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    u32::from_str_radix(&digits[..end], radix).ok()
}

/// Custom error code carried by a transport error string
pub fn parse_custom_code(err: &str) -> Option<u32> {
    if err.contains("custom program error:") {
        let parts: Vec<&str> = err.split("custom program error: ").collect();
        if parts.len() != 2 {
            return None;
        }
        return parse_leading_int(parts[1]);
    }

    let mut matches = CUSTOM_JSON_RE.captures_iter(err);
    let only = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    only[1].parse().ok()
}

/// Outcome of translating a failed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatedError {
    Anchor(AnchorError),
    Program(ProgramError),
    /// Nothing recognizable; the original error is kept as is
    Untranslated {
        original: String,
        program_error_stack: Option<ProgramErrorStack>,
    },
}

impl TranslatedError {
    pub fn is_translated(&self) -> bool {
        !matches!(self, TranslatedError::Untranslated { .. })
    }

    /// Call stack at the time of failure, if logs were available
    pub fn program_error_stack(&self) -> Option<&ProgramErrorStack> {
        match self {
            TranslatedError::Anchor(e) => Some(&e.program_error_stack),
            TranslatedError::Program(e) => e.program_error_stack.as_ref(),
            TranslatedError::Untranslated {
                program_error_stack,
                ..
            } => program_error_stack.as_ref(),
        }
    }

    /// The program that failed
    pub fn program(&self) -> Option<&Pubkey> {
        self.program_error_stack()?.failed_program()
    }
}

impl fmt::Display for TranslatedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslatedError::Anchor(e) => write!(f, "{}", e),
            TranslatedError::Program(e) => write!(f, "{}", e),
            TranslatedError::Untranslated { original, .. } => write!(f, "{}", original),
        }
    }
}

impl std::error::Error for TranslatedError {}

/// Translates errors of one program
#[derive(Debug, Clone, Default)]
pub struct ErrorTranslator {
    idl_errors: HashMap<u32, String>,
}

impl ErrorTranslator {
    /// Uses the IDL's error table (message, or name when no message is declared)
    pub fn new(idl: &Idl) -> Self {
        Self {
            idl_errors: idl.error_messages(),
        }
    }

    pub fn with_errors(idl_errors: HashMap<u32, String>) -> Self {
        Self { idl_errors }
    }

    /// Structured log error first, then the numeric code in `err`. Logs may
    /// be empty.
    pub fn translate<S: AsRef<str>>(&self, err: &str, logs: &[S]) -> TranslatedError {
        if let Some(anchor) = AnchorError::parse(logs) {
            return TranslatedError::Anchor(anchor);
        }

        debug!("No structured error in logs, trying numeric error code");
        if let Some(program) = ProgramError::parse(err, logs, &self.idl_errors) {
            return TranslatedError::Program(program);
        }

        debug!(error = %err, "Error left untranslated");
        TranslatedError::Untranslated {
            original: err.to_string(),
            program_error_stack: (!logs.is_empty()).then(|| ProgramErrorStack::parse(logs)),
        }
    }

    /// Like [`ErrorTranslator::translate`], but an untranslated error is
    /// returned as [`Error::Untranslatable`]
    pub fn try_translate<S: AsRef<str>>(&self, err: &str, logs: &[S]) -> Result<TranslatedError> {
        match self.translate(err, logs) {
            TranslatedError::Untranslated { original, .. } => {
                Err(Error::Untranslatable { message: original })
            }
            translated => Ok(translated),
        }
    }
}

/// One-shot translation against a code to message table
pub fn translate_error<S: AsRef<str>>(
    err: &str,
    logs: &[S],
    idl_errors: &HashMap<u32, String>,
) -> TranslatedError {
    ErrorTranslator::with_errors(idl_errors.clone()).translate(err, logs)
}
