//! Configuration for codec construction and log parsing

/// How [`crate::coder::AccountsCoder::decode`] treats the 8-byte prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscriminatorCheck {
    /// Strip 8 bytes without looking at them
    #[default]
    Unchecked,
    /// Reject data whose prefix is not the account's discriminator
    Checked,
}

/// Codec options
#[derive(Debug, Clone, Default)]
pub struct CoderOptions {
    /// Account decode behaviour
    pub account_check: DiscriminatorCheck,
}

impl CoderOptions {
    /// Options that validate account discriminators on decode
    pub fn checked() -> Self {
        Self {
            account_check: DiscriminatorCheck::Checked,
        }
    }
}

/// Log parsing options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Treat `Program data: ` lines as event candidates alongside `Program log: `
    pub accept_program_data: bool,
    /// Report a trace whose execution stack is not empty at the end as malformed
    pub strict_balance: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            accept_program_data: true,
            strict_balance: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            CoderOptions::default().account_check,
            DiscriminatorCheck::Unchecked
        );
        let parse = ParseOptions::default();
        assert!(parse.accept_program_data);
        assert!(!parse.strict_balance);
    }
}
