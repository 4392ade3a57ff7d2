//! Error types for idlcoder

use thiserror::Error;

/// Codec, log-interpretation and translation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Layout compilation errors
    /// A `defined` type reference did not resolve to exactly one type definition
    ///
    /// **Triggered by:** `{"defined": "Foo"}` when the IDL has no (or more than one) `Foo` in `types`
    /// **Prevention:** Make sure every referenced type is declared once in the IDL
    #[error("Type not found: {name}")]
    TypeNotFound {
        /// Referenced type name
        name: String,
    },

    /// The IDL uses a type shape the compiler refuses to guess a layout for
    ///
    /// **Triggered by:** tuple enum variants, explicit enum discriminants,
    /// recursive type definitions, unrecognized JSON type objects
    #[error("Unsupported type shape: {shape}")]
    UnsupportedShape {
        /// Description of the offending shape
        shape: String,
    },

    /// Scalar type tag this crate has no layout for
    ///
    /// **Triggered by:** `"f64"`, `"u256"` or any other unknown primitive name
    #[error("Not yet implemented: {type_name}")]
    NotImplemented {
        /// The unknown scalar tag
        type_name: String,
    },

    // Registry errors
    /// Encode/decode requested for a name the registry does not contain
    #[error("Unknown {kind}: {name}")]
    UnknownName {
        /// Registry kind (account, instruction, event, type)
        kind: &'static str,
        /// Requested name
        name: String,
    },

    // Data errors
    /// Input buffer ended before the layout was fully decoded
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun {
        /// Bytes the layout needed
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Bytes were present but do not form a valid value for the layout
    ///
    /// **Triggered by:** option tag other than 0/1, out-of-range enum index,
    /// invalid UTF-8 in a string, bool byte other than 0/1
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// What was wrong
        reason: String,
    },

    /// Value passed to an encoder does not match the layout
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Layout type name
        expected: String,
        /// Value type name
        got: String,
    },

    /// Struct value is missing a field the layout requires
    #[error("Missing field: {field}")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Account data did not start with the expected 8-byte discriminator
    #[error("Invalid account discriminator for {name}")]
    DiscriminatorMismatch {
        /// Account name
        name: String,
    },

    /// IDL JSON could not be parsed
    #[error("IDL parse error: {0}")]
    IdlParse(String),

    // Log interpretation errors
    /// A log line could not be interpreted
    ///
    /// Non-fatal during event scanning: the line is skipped.
    #[error("Malformed log line {line:?}: {reason}")]
    MalformedLog {
        /// Offending line
        line: String,
        /// Why it was rejected
        reason: String,
    },

    /// A completion line arrived with nothing on the execution stack
    ///
    /// Signals a log stream that violates the runtime's invoke/consumed
    /// pairing. Never retried.
    #[error("Execution stack underflow at line {index}: {line:?}")]
    StackUnderflow {
        /// Zero-based position of the line in the trace
        index: usize,
        /// Offending line
        line: String,
    },

    // Translation errors
    /// Neither a structured error log nor a numeric custom error code was found
    #[error("Untranslatable error: {message}")]
    Untranslatable {
        /// The original error text
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Deterministic failure; retrying cannot change the outcome
    Fatal,
    /// Caller can fall back (e.g. re-raise the original error)
    Recoverable,
    /// Skipped locally, processing continues
    Warning,
}

impl Error {
    /// Create an invalid data error with a message
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Error::InvalidData {
            reason: reason.into(),
        }
    }

    /// Create an unsupported shape error with a message
    pub fn unsupported(shape: impl Into<String>) -> Self {
        Error::UnsupportedShape {
            shape: shape.into(),
        }
    }

    /// Create a malformed log error for `line`
    pub fn malformed_log(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedLog {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::TypeNotFound { .. } => ErrorSeverity::Fatal,
            Error::UnsupportedShape { .. } => ErrorSeverity::Fatal,
            Error::NotImplemented { .. } => ErrorSeverity::Fatal,
            Error::UnknownName { .. } => ErrorSeverity::Fatal,
            Error::StackUnderflow { .. } => ErrorSeverity::Fatal,
            Error::IdlParse(_) => ErrorSeverity::Fatal,

            Error::BufferUnderrun { .. } => ErrorSeverity::Fatal,
            Error::InvalidData { .. } => ErrorSeverity::Fatal,
            Error::TypeMismatch { .. } => ErrorSeverity::Fatal,
            Error::MissingField { .. } => ErrorSeverity::Fatal,
            Error::DiscriminatorMismatch { .. } => ErrorSeverity::Fatal,

            Error::MalformedLog { .. } => ErrorSeverity::Warning,

            Error::Untranslatable { .. } => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for idlcoder operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let underflow = Error::StackUnderflow {
            index: 3,
            line: "Program X consumed 1 of 2 compute units".to_string(),
        };
        assert_eq!(underflow.classify(), ErrorSeverity::Fatal);
        assert_eq!(
            Error::malformed_log("garbage", "not base64").classify(),
            ErrorSeverity::Warning
        );
        assert_eq!(
            Error::Untranslatable {
                message: "boom".to_string()
            }
            .classify(),
            ErrorSeverity::Recoverable
        );
    }

    #[test]
    fn test_messages() {
        let err = Error::TypeNotFound {
            name: "Foo".to_string(),
        };
        assert_eq!(err.to_string(), "Type not found: Foo");

        let err = Error::UnknownName {
            kind: "account",
            name: "Bar".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown account: Bar");
    }
}
