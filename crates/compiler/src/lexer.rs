//! Lexer for Porth source files.
//!
//! Tokens are whitespace-delimited words with 1-based line and column
//! positions. A token that is exactly `//` ends the line; everything after
//! it is discarded.

use crate::error::Error;
use crate::ops::SourceLocation;
use std::fs;
use std::path::Path;

/// A word with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub location: SourceLocation,
    pub text: String,
}

impl Token {
    fn new(file: &Path, line: usize, column: usize, text: &str) -> Self {
        Token {
            location: SourceLocation::new(file, line, column),
            text: text.to_string(),
        }
    }
}

/// Read and tokenize a source file.
pub fn lex_file(path: &Path) -> Result<Vec<Token>, Error> {
    let source = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to open {} for reading", path.display()), e))?;
    Ok(lex_source(path, &source))
}

/// Tokenize an in-memory source string. `path` is only used for positions.
pub fn lex_source(path: &Path, source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (line_index, line) in source.lines().enumerate() {
        lex_line(path, line_index + 1, line, &mut tokens);
    }
    tokens
}

fn lex_line(path: &Path, line_number: usize, line: &str, tokens: &mut Vec<Token>) {
    let mut rest = line;
    let mut offset = 0;
    loop {
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }
        let end = trimmed
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(trimmed.len());
        let text = &trimmed[..end];
        if text == "//" {
            break;
        }
        tokens.push(Token::new(path, line_number, offset + 1, text));
        rest = &trimmed[end..];
        offset += end;
    }
}
