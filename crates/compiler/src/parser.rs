//! Token-to-op parser.
//!
//! Each token is either a reserved word or a base-10 signed 64-bit integer
//! literal. Anything else is a parse error, and parsing halts there.

use crate::error::Error;
use crate::lexer::Token;
use crate::ops::{Op, OpKind, OP_KIND_COUNT};

/// Reserved vocabulary, source text to op kind.
///
/// Covers every [`OpKind`] except `Push`, which only integer literals
/// produce; see the table-coverage test below.
pub const BUILTIN_WORDS: &[(&str, OpKind)] = &[
    ("+", OpKind::Plus),
    ("-", OpKind::Minus),
    ("mod", OpKind::Mod),
    ("print", OpKind::Print),
    ("=", OpKind::Eq),
    ("!=", OpKind::Ne),
    (">", OpKind::Gt),
    ("<", OpKind::Lt),
    (">=", OpKind::Ge),
    ("<=", OpKind::Le),
    ("shr", OpKind::Shr),
    ("shl", OpKind::Shl),
    ("bor", OpKind::Bor),
    ("band", OpKind::Band),
    ("if", OpKind::If),
    ("end", OpKind::End),
    ("else", OpKind::Else),
    ("dup", OpKind::Dup),
    ("dup2", OpKind::Dup2),
    ("swap", OpKind::Swap),
    ("drop", OpKind::Drop),
    ("over", OpKind::Over),
    ("while", OpKind::While),
    ("do", OpKind::Do),
    ("mem", OpKind::Mem),
    (".", OpKind::Store),
    (",", OpKind::Load),
    ("syscall1", OpKind::Syscall1),
    ("syscall2", OpKind::Syscall2),
    ("syscall3", OpKind::Syscall3),
    ("syscall4", OpKind::Syscall4),
    ("syscall5", OpKind::Syscall5),
    ("syscall6", OpKind::Syscall6),
];

/// Convert one token into an op.
pub fn parse_token(token: &Token) -> Result<Op, Error> {
    if let Some((_, kind)) = BUILTIN_WORDS.iter().find(|(word, _)| *word == token.text) {
        return Ok(Op::new(*kind, token.location.clone()));
    }
    match token.text.parse::<i64>() {
        Ok(value) => Ok(Op::push(value, token.location.clone())),
        Err(_) => Err(Error::Parse {
            location: token.location.clone(),
            word: token.text.clone(),
        }),
    }
}

/// Convert a token stream into an op sequence, halting on the first error.
pub fn parse_tokens(tokens: &[Token]) -> Result<Vec<Op>, Error> {
    tokens.iter().map(parse_token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_source;
    use std::path::Path;

    fn parse(source: &str) -> Result<Vec<Op>, Error> {
        parse_tokens(&lex_source(Path::new("test.porth"), source))
    }

    #[test]
    fn test_table_covers_every_kind_except_push() {
        assert_eq!(BUILTIN_WORDS.len(), OP_KIND_COUNT - 1);
        for (word, kind) in BUILTIN_WORDS {
            assert_ne!(*kind, OpKind::Push, "'{}' must not map to Push", word);
        }
        // No duplicate spellings.
        for (i, (word, _)) in BUILTIN_WORDS.iter().enumerate() {
            assert!(
                !BUILTIN_WORDS[i + 1..].iter().any(|(w, _)| w == word),
                "duplicate reserved word '{}'",
                word
            );
        }
    }

    #[test]
    fn test_every_reserved_word_parses_to_its_kind() {
        for (word, kind) in BUILTIN_WORDS {
            let ops = parse(word).unwrap();
            assert_eq!(ops.len(), 1);
            assert_eq!(ops[0].kind, *kind, "word '{}'", word);
            assert_eq!(ops[0].operand, 0);
        }
    }

    #[test]
    fn test_integer_literals() {
        let ops = parse("0 42 -17").unwrap();
        assert_eq!(ops[0].kind, OpKind::Push);
        assert_eq!(ops[0].operand, 0);
        assert_eq!(ops[1].operand, 42);
        assert_eq!(ops[2].operand, -17);
    }

    #[test]
    fn test_i64_extremes_round_trip() {
        let ops = parse("-9223372036854775808 9223372036854775807").unwrap();
        assert_eq!(ops[0].operand, i64::MIN);
        assert_eq!(ops[1].operand, i64::MAX);
    }

    #[test]
    fn test_out_of_range_literal_is_parse_error() {
        let err = parse("9223372036854775808").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unknown_word_is_parse_error_with_location() {
        let err = parse("1 2 bogus").unwrap_err();
        match err {
            Error::Parse { location, word } => {
                assert_eq!(word, "bogus");
                assert_eq!(location.line, 1);
                assert_eq!(location.column, 5);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parsing_halts_on_first_error() {
        // The error carries the first offending word, not a later one.
        let err = parse("bad1 bad2").unwrap_err();
        match err {
            Error::Parse { word, .. } => assert_eq!(word, "bad1"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_minus_is_the_word_not_a_sign() {
        let ops = parse("-").unwrap();
        assert_eq!(ops[0].kind, OpKind::Minus);
    }
}
