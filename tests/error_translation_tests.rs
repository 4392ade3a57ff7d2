//! Translating failed transactions into typed errors

use idlcoder::program::{ComparedValues, Origin};
use idlcoder::{Error, ErrorSeverity, ErrorTranslator, Idl, Pubkey, TranslatedError};

const MARKET_IDL: &str = include_str!("fixtures/market_idl.json");

fn translator() -> ErrorTranslator {
    ErrorTranslator::new(&Idl::parse(MARKET_IDL).unwrap())
}

fn program(n: u8) -> Pubkey {
    Pubkey::new_from_array([n; 32])
}

// =============================================================================
// STRUCTURED ERRORS
// =============================================================================

#[test]
fn test_structured_error_with_file_line() {
    let p = program(1);
    let logs = vec![
        format!("Program {} invoke [1]", p),
        "Program log: Instruction: Hello".to_string(),
        "Program log: AnchorError thrown in lib.rs:13. Error Code: Hello. Error Number: 6000. Error Message: custom msg.".to_string(),
        format!("Program {} consumed 3000 of 200000 compute units", p),
        format!("Program {} failed: custom program error: 0x1770", p),
    ];

    match translator().translate("custom program error: 0x1770", &logs) {
        TranslatedError::Anchor(err) => {
            assert_eq!(err.error_code.code, "Hello");
            assert_eq!(err.error_code.number, 6000);
            assert_eq!(err.error_message, "custom msg.");
            assert_eq!(
                err.origin,
                Some(Origin::FileLine {
                    file: "lib.rs".to_string(),
                    line: 13
                })
            );
            assert_eq!(err.program(), Some(&p));
        }
        other => panic!("expected structured error, got {:?}", other),
    }
}

#[test]
fn test_compared_values_address_form() {
    let addr_a = program(10);
    let addr_b = program(11);
    let logs = vec![
        "Program log: AnchorError caused by account: vault. Error Code: ConstraintHasOne. Error Number: 2001. Error Message: A has one constraint was violated.".to_string(),
        "Program log: Left:".to_string(),
        format!("Program log: {}", addr_a),
        "Program log: Right:".to_string(),
        format!("Program log: {}", addr_b),
    ];

    let TranslatedError::Anchor(err) = translator().translate("", &logs) else {
        panic!("expected structured error");
    };
    assert_eq!(err.origin, Some(Origin::Account("vault".to_string())));
    assert_eq!(
        err.compared_values,
        Some(ComparedValues::Pubkeys(addr_a, addr_b))
    );
    assert_eq!(
        err.compared_values.unwrap().rendered(),
        (addr_a.to_string(), addr_b.to_string())
    );
}

#[test]
fn test_compared_values_inline_form() {
    let logs = [
        "Program log: AnchorError occurred. Error Code: RequireGtViolated. Error Number: 2505. Error Message: A require_gt expression was violated.",
        "Program log: Left: 5",
        "Program log: Right: 10",
    ];
    let TranslatedError::Anchor(err) = translator().translate("", &logs) else {
        panic!("expected structured error");
    };
    assert_eq!(err.origin, None);
    assert_eq!(
        err.compared_values,
        Some(ComparedValues::Values("5".to_string(), "10".to_string()))
    );
    assert_eq!(err.error_logs.len(), 3);
}

// =============================================================================
// NUMERIC FALLBACK
// =============================================================================

#[test]
fn test_idl_error_without_message_uses_name() {
    let translated = translator().translate(
        "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771",
        &[] as &[&str],
    );
    match translated {
        TranslatedError::Program(err) => {
            assert_eq!(err.code, 6001);
            assert_eq!(err.msg, "MarketClosed");
            assert_eq!(err.to_string(), "MarketClosed");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_framework_error_from_json_form() {
    let p = program(2);
    let logs = vec![
        format!("Program {} invoke [1]", p),
        format!("Program {} failed: custom program error: 0x7d1", p),
    ];
    let translated = translator().translate(
        r#"{"InstructionError":[0,{"Custom":2001}]}"#,
        &logs,
    );
    match &translated {
        TranslatedError::Program(err) => {
            assert_eq!(err.msg, "A has one constraint was violated");
            assert_eq!(err.program(), Some(&p));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(translated.program(), Some(&p));
}

#[test]
fn test_untranslated_error_keeps_original_and_stack() {
    let outer = program(3);
    let inner = program(4);
    let logs = vec![
        format!("Program {} invoke [1]", outer),
        format!("Program {} invoke [2]", inner),
        format!("Program {} failed: insufficient funds", inner),
    ];
    let original = "Transaction simulation failed: insufficient funds";
    let translated = translator().translate(original, &logs);

    assert!(!translated.is_translated());
    assert_eq!(translated.to_string(), original);
    assert_eq!(
        translated.program_error_stack().unwrap().stack,
        vec![outer, inner]
    );
    assert_eq!(translated.program(), Some(&inner));

    let err = translator().try_translate(original, &logs).unwrap_err();
    assert_eq!(err.classify(), ErrorSeverity::Recoverable);
    assert!(matches!(err, Error::Untranslatable { .. }));
}
