//! Error codes reserved by the framework. Program-defined errors start at
//! [`ERROR_CODE_OFFSET`].

use std::collections::HashMap;

use lazy_static::lazy_static;

/// First code available to program-defined errors
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// A framework-reserved error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LangError {
    pub code: u32,
    pub name: &'static str,
    pub msg: &'static str,
}

const fn lang(code: u32, name: &'static str, msg: &'static str) -> LangError {
    LangError { code, name, msg }
}

/// Every reserved code, ascending
pub const LANG_ERRORS: &[LangError] = &[
    // Instructions
    lang(100, "InstructionMissing", "8 byte instruction identifier not provided"),
    lang(101, "InstructionFallbackNotFound", "Fallback functions are not supported"),
    lang(102, "InstructionDidNotDeserialize", "The program could not deserialize the given instruction"),
    lang(103, "InstructionDidNotSerialize", "The program could not serialize the given instruction"),
    // IDL instructions
    lang(1000, "IdlInstructionStub", "The program was compiled without idl instructions"),
    lang(1001, "IdlInstructionInvalidProgram", "The transaction was given an invalid program for the IDL instruction"),
    lang(1002, "IdlAccountNotEmpty", "IDL account must be empty in order to resize, try closing first"),
    // Event instructions
    lang(1500, "EventInstructionStub", "The program was compiled without `event-cpi` feature"),
    // Constraints
    lang(2000, "ConstraintMut", "A mut constraint was violated"),
    lang(2001, "ConstraintHasOne", "A has one constraint was violated"),
    lang(2002, "ConstraintSigner", "A signer constraint was violated"),
    lang(2003, "ConstraintRaw", "A raw constraint was violated"),
    lang(2004, "ConstraintOwner", "An owner constraint was violated"),
    lang(2005, "ConstraintRentExempt", "A rent exemption constraint was violated"),
    lang(2006, "ConstraintSeeds", "A seeds constraint was violated"),
    lang(2007, "ConstraintExecutable", "An executable constraint was violated"),
    lang(2008, "ConstraintState", "Deprecated Error, feel free to replace with something else"),
    lang(2009, "ConstraintAssociated", "An associated constraint was violated"),
    lang(2010, "ConstraintAssociatedInit", "An associated init constraint was violated"),
    lang(2011, "ConstraintClose", "A close constraint was violated"),
    lang(2012, "ConstraintAddress", "An address constraint was violated"),
    lang(2013, "ConstraintZero", "Expected zero account discriminant"),
    lang(2014, "ConstraintTokenMint", "A token mint constraint was violated"),
    lang(2015, "ConstraintTokenOwner", "A token owner constraint was violated"),
    lang(2016, "ConstraintMintMintAuthority", "A mint mint authority constraint was violated"),
    lang(2017, "ConstraintMintFreezeAuthority", "A mint freeze authority constraint was violated"),
    lang(2018, "ConstraintMintDecimals", "A mint decimals constraint was violated"),
    lang(2019, "ConstraintSpace", "A space constraint was violated"),
    lang(2020, "ConstraintAccountIsNone", "A required account for the constraint is None"),
    lang(2021, "ConstraintTokenTokenProgram", "A token account token program constraint was violated"),
    lang(2022, "ConstraintMintTokenProgram", "A mint token program constraint was violated"),
    lang(2023, "ConstraintAssociatedTokenTokenProgram", "An associated token account token program constraint was violated"),
    lang(2024, "ConstraintMintGroupPointerExtension", "A group pointer extension constraint was violated"),
    lang(2025, "ConstraintMintGroupPointerExtensionAuthority", "A group pointer extension authority constraint was violated"),
    lang(2026, "ConstraintMintGroupPointerExtensionGroupAddress", "A group pointer extension group address constraint was violated"),
    lang(2027, "ConstraintMintGroupMemberPointerExtension", "A group member pointer extension constraint was violated"),
    lang(2028, "ConstraintMintGroupMemberPointerExtensionAuthority", "A group member pointer extension authority constraint was violated"),
    lang(2029, "ConstraintMintGroupMemberPointerExtensionMemberAddress", "A group member pointer extension group address constraint was violated"),
    lang(2030, "ConstraintMintMetadataPointerExtension", "A metadata pointer extension constraint was violated"),
    lang(2031, "ConstraintMintMetadataPointerExtensionAuthority", "A metadata pointer extension authority constraint was violated"),
    lang(2032, "ConstraintMintMetadataPointerExtensionMetadataAddress", "A metadata pointer extension metadata address constraint was violated"),
    lang(2033, "ConstraintMintCloseAuthorityExtension", "A close authority constraint was violated"),
    lang(2034, "ConstraintMintCloseAuthorityExtensionAuthority", "A close authority extension authority constraint was violated"),
    lang(2035, "ConstraintMintPermanentDelegateExtension", "A permanent delegate extension constraint was violated"),
    lang(2036, "ConstraintMintPermanentDelegateExtensionDelegate", "A permanent delegate extension delegate constraint was violated"),
    lang(2037, "ConstraintMintTransferHookExtension", "A transfer hook extension constraint was violated"),
    lang(2038, "ConstraintMintTransferHookExtensionAuthority", "A transfer hook extension authority constraint was violated"),
    lang(2039, "ConstraintMintTransferHookExtensionProgramId", "A transfer hook extension transfer hook program id constraint was violated"),
    // Require
    lang(2500, "RequireViolated", "A require expression was violated"),
    lang(2501, "RequireEqViolated", "A require_eq expression was violated"),
    lang(2502, "RequireKeysEqViolated", "A require_keys_eq expression was violated"),
    lang(2503, "RequireNeqViolated", "A require_neq expression was violated"),
    lang(2504, "RequireKeysNeqViolated", "A require_keys_neq expression was violated"),
    lang(2505, "RequireGtViolated", "A require_gt expression was violated"),
    lang(2506, "RequireGteViolated", "A require_gte expression was violated"),
    // Accounts
    lang(3000, "AccountDiscriminatorAlreadySet", "The account discriminator was already set on this account"),
    lang(3001, "AccountDiscriminatorNotFound", "No 8 byte discriminator was found on the account"),
    lang(3002, "AccountDiscriminatorMismatch", "8 byte discriminator did not match what was expected"),
    lang(3003, "AccountDidNotDeserialize", "Failed to deserialize the account"),
    lang(3004, "AccountDidNotSerialize", "Failed to serialize the account"),
    lang(3005, "AccountNotEnoughKeys", "Not enough account keys given to the instruction"),
    lang(3006, "AccountNotMutable", "The given account is not mutable"),
    lang(3007, "AccountOwnedByWrongProgram", "The given account is owned by a different program than expected"),
    lang(3008, "InvalidProgramId", "Program ID was not as expected"),
    lang(3009, "InvalidProgramExecutable", "Program account is not executable"),
    lang(3010, "AccountNotSigner", "The given account did not sign"),
    lang(3011, "AccountNotSystemOwned", "The given account is not owned by the system program"),
    lang(3012, "AccountNotInitialized", "The program expected this account to be already initialized"),
    lang(3013, "AccountNotProgramData", "The given account is not a program data account"),
    lang(3014, "AccountNotAssociatedTokenAccount", "The given account is not the associated token account"),
    lang(3015, "AccountSysvarMismatch", "The given public key does not match the required sysvar"),
    lang(3016, "AccountReallocExceedsLimit", "The account reallocation exceeds the MAX_PERMITTED_DATA_INCREASE limit"),
    lang(3017, "AccountDuplicateReallocs", "The account was duplicated for more than one reallocation"),
    // State (legacy)
    lang(4000, "StateInvalidAddress", "The given state account does not have the correct address"),
    // Miscellaneous
    lang(4100, "DeclaredProgramIdMismatch", "The declared program id does not match the actual program id"),
    lang(4101, "TryingToInitPayerAsProgramAccount", "You cannot/should not initialize the payer account as a program account"),
    lang(4102, "InvalidNumericConversion", "The program could not perform the numeric conversion, out of range integral type conversion attempted"),
    // Deprecated
    lang(5000, "Deprecated", "The API being used is deprecated and should no longer be used"),
];

lazy_static! {
    static ref BY_CODE: HashMap<u32, &'static LangError> =
        LANG_ERRORS.iter().map(|e| (e.code, e)).collect();
}

/// Looks up a reserved code
pub fn lang_error(code: u32) -> Option<&'static LangError> {
    BY_CODE.get(&code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in LANG_ERRORS.windows(2) {
            assert!(pair[0].code < pair[1].code, "{} !< {}", pair[0].code, pair[1].code);
        }
        assert!(LANG_ERRORS.iter().all(|e| e.code < ERROR_CODE_OFFSET));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lang_error(2006).unwrap().msg, "A seeds constraint was violated");
        assert_eq!(lang_error(3012).unwrap().name, "AccountNotInitialized");
        assert_eq!(lang_error(4000).unwrap().name, "StateInvalidAddress");
        assert!(lang_error(6000).is_none());
    }
}
