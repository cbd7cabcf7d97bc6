use proptest::prelude::*;

use scriptlang::lexer::{TokenKind, tokenize, tokenize_all};

/// One lexically valid fragment of source text.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        prop_oneof![
            Just("=="),
            Just("!="),
            Just(">="),
            Just("<="),
            Just(">"),
            Just("<"),
            Just("="),
            Just("+"),
            Just("-"),
            Just("*"),
            Just("/"),
            Just(";"),
            Just("("),
            Just(")"),
            Just(","),
        ]
        .prop_map(str::to_string),
        "[A-Za-z_][A-Za-z0-9_]{0,8}",
        "[0-9]{1,6}",
        "[a-zA-Z0-9_ #=]{0,10}".prop_map(|body| format!("\"{body}\"")),
        "[a-z ]{0,6}".prop_map(|body| format!("\"{body}\\n\\\"\"")),
        "[a-z ]{0,10}".prop_map(|text| format!("#{text}\n")),
    ]
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(" "), Just("\t"), Just("\n"), Just("\r\n"), Just("")]
}

fn source() -> impl Strategy<Value = String> {
    proptest::collection::vec((fragment(), separator()), 0..40).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(fragment, sep)| fragment + sep)
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn token_stream_ends_with_single_eof(src in source()) {
        let tokens = tokenize_all(&src).unwrap();
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        prop_assert_eq!(eofs, 1, "source: {:?}", src);
    }

    #[test]
    fn relexing_is_deterministic(src in source()) {
        let first = tokenize_all(&src).unwrap();
        let second = tokenize_all(&src).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn lexer_stays_exhausted_after_eof(src in source()) {
        let mut lexer = tokenize(&src);
        let mut saw_eof = false;
        for item in lexer.by_ref() {
            let token = item.unwrap();
            prop_assert!(!saw_eof, "token after Eof in {:?}", src);
            saw_eof = token.kind == TokenKind::Eof;
        }
        prop_assert!(saw_eof);
        prop_assert!(lexer.next().is_none());
    }

    #[test]
    fn positions_never_move_backwards(src in source()) {
        let tokens = tokenize_all(&src).unwrap();
        for pair in tokens.windows(2) {
            prop_assert!(
                (pair[0].line, pair[0].col) < (pair[1].line, pair[1].col),
                "{:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}
