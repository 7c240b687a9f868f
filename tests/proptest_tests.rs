//! Property-based tests for the scanner, parser and interpreter
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. Scanning, parsing and linting never panic on arbitrary input
//! 2. Arithmetic follows left-to-right folding and truncating division
//! 3. Parsing is deterministic and the rendered tree parses back to itself

use pati::{Interpreter, LanguageOptions, Linter, Parser, Program, ProgramLine, Scanner};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Clears source line numbers so trees from differently laid out sources compare equal
fn without_lines(program: Program) -> Program {
    let strip = |block: &[ProgramLine]| -> Box<[ProgramLine]> {
        block
            .iter()
            .cloned()
            .map(|mut line| {
                line.line = 0;
                line
            })
            .collect()
    };
    Program {
        main: strip(&program.main),
        procedures: program
            .procedures
            .iter()
            .map(|(name, body)| (name.clone(), strip(body)))
            .collect(),
    }
}

/// Random printable text, including line breaks
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x09\x0A\x20-\x7E]{0,300}").unwrap()
}

/// Token soup built from the language's own vocabulary
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(soup_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn soup_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("LET".to_string()),
        Just("IF".to_string()),
        Just("THEN".to_string()),
        Just("PRINT".to_string()),
        Just("INPUT".to_string()),
        Just("CALL".to_string()),
        Just("RETURN".to_string()),
        Just("END".to_string()),
        Just("PROC".to_string()),
        Just("REM".to_string()),
        Just("\n".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just(",".to_string()),
        Just("=".to_string()),
        Just("<>".to_string()),
        Just("<=".to_string()),
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        (0i64..1000).prop_map(|n| n.to_string()),
        "[A-Z]".prop_map(|s| s),
        "[a-z][a-z0-9_]{0,6}".prop_map(|s| s),
        r#""[a-z ]{0,8}""#.prop_map(|s| s),
    ]
}

fn variable() -> impl Strategy<Value = String> {
    "[A-F]".prop_map(|s| s)
}

/// Small well-formed expressions
fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![(0i64..100).prop_map(|n| n.to_string()), variable()];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/"]), inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("({})", e)),
            inner.prop_map(|e| format!("-{}", e)),
        ]
    })
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (variable(), expression()).prop_map(|(v, e)| format!("LET {} = {}", v, e)),
        prop::collection::vec(expression(), 0..3)
            .prop_map(|items| format!("PRINT {}", items.join(", "))),
        (expression(), expression()).prop_map(|(l, r)| format!("IF {} < {} THEN PRINT 1", l, r)),
        (variable(), expression()).prop_map(|(v, e)| format!("CALL p({} = {})", v, e)),
        Just("RETURN".to_string()),
    ]
}

/// Well-formed programs: labelled main lines plus one procedure
fn valid_program() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(statement(), 1..8),
        prop::collection::vec(statement(), 0..4),
    )
        .prop_map(|(main, body)| {
            let mut source = String::new();
            for (i, stmt) in main.iter().enumerate() {
                source.push_str(&format!("m{} {}\n", i, stmt));
            }
            source.push_str("PROC p {\n");
            for (i, stmt) in body.iter().enumerate() {
                source.push_str(&format!("  p{} {}\n", i, stmt));
            }
            source.push_str("}\n");
            source
        })
}

fn parse(source: &str) -> pati::Result<Program> {
    Parser::new(Scanner::new(source).scan_tokens()).parse()
}

fn print_output(source: &str) -> String {
    let program = parse(source).unwrap();
    let mut interpreter = Interpreter::new(std::io::empty(), Vec::new());
    let report = interpreter.execute(&program);
    assert_eq!(report.fatal, None);
    String::from_utf8(interpreter.into_output()).unwrap()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn scanner_and_parser_never_panic(source in arbitrary_source_string()) {
        let _ = parse(&source);
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash(
        depth in 129usize..20_000,
        open in prop::sample::select(vec!["(", "-", "+"]),
    ) {
        let source = format!("a LET A = {}1", open.repeat(depth));
        let err = parse(&source).unwrap_err();
        prop_assert_eq!(err.code(), 28);
    }

    #[test]
    fn parser_never_panics_on_token_soup(source in token_soup()) {
        let _ = parse(&source);
    }

    #[test]
    fn linter_never_panics(source in token_soup()) {
        let _ = Linter::new().lint(&source);
    }

    #[test]
    fn additive_chain_folds_left(
        head in 0i64..1000,
        rest in prop::collection::vec((prop::bool::ANY, 0i64..1000), 0..10),
    ) {
        let mut source = format!("a PRINT {}", head);
        let mut expected = head;
        for (add, n) in &rest {
            if *add {
                source.push_str(&format!(" + {}", n));
                expected += n;
            } else {
                source.push_str(&format!(" - {}", n));
                expected -= n;
            }
        }
        prop_assert_eq!(print_output(&source), format!("{}\n", expected));
    }

    #[test]
    fn division_truncates_toward_zero(a in -10_000i64..10_000, b in -100i64..100) {
        prop_assume!(b != 0);
        let source = format!("a PRINT {} / {}", a, b);
        prop_assert_eq!(print_output(&source), format!("{}\n", a / b));
    }

    #[test]
    fn parsing_is_deterministic(source in valid_program()) {
        let first = parse(&source);
        let second = parse(&source);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rendered_program_parses_back(source in valid_program()) {
        let original = parse(&source).unwrap();
        let reparsed = parse(&original.to_string()).unwrap();
        prop_assert_eq!(without_lines(reparsed), without_lines(original));
    }

    #[test]
    fn valid_programs_run_without_fatal_errors(source in valid_program()) {
        let program = parse(&source).unwrap();
        let options = LanguageOptions { call_depth_limit: 64, ..LanguageOptions::default() };
        let mut interpreter = Interpreter::with_options(std::io::empty(), std::io::sink(), options);
        // CALL p can recurse through the body, which may legitimately hit the limit
        if let Some(e) = interpreter.execute(&program).fatal {
            prop_assert_eq!(e.code(), 26);
        }
    }
}
