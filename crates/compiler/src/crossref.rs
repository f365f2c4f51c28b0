//! Block cross-referencer.
//!
//! Second pass over the op sequence that resolves the operand of every
//! structured control-flow word to an absolute instruction index, using an
//! auxiliary stack of open-block indices.
//!
//! After this pass the targets obey one contract shared by the simulator and
//! the C++ generator:
//!
//! - `if`: operand points just past the matching `else` (or at the matching
//!   `end` when there is none); taken when the condition is zero.
//! - `else`: operand is the matching `end`, whose own jump is a plain
//!   fall-through.
//! - `do`: operand is the loop exit, `end_ip + 1`; taken when zero.
//! - `end` closing an `if`/`else`: operand is `ip + 1` (plain fall-through).
//! - `end` closing a `do`: operand is the loop head, the `while` index.
//! - `while`: jump target only; its own operand stays 0.

use crate::error::Error;
use crate::ops::{Op, OpKind};

/// Resolve control-flow targets in place and hand the program back.
///
/// Fails on misnested or unclosed blocks. Every resolved operand lands in
/// `[0, program.len()]`; `program.len()` is the off-the-end exit label.
pub fn cross_reference_blocks(mut program: Vec<Op>) -> Result<Vec<Op>, Error> {
    let mut blocks: Vec<usize> = Vec::new();
    for ip in 0..program.len() {
        match program[ip].kind {
            OpKind::If | OpKind::While => blocks.push(ip),
            OpKind::Else => {
                let if_ip = blocks
                    .pop()
                    .ok_or_else(|| open_block_error("`else`", &program[ip]))?;
                if program[if_ip].kind != OpKind::If {
                    return Err(Error::semantic(
                        "`else` can only be used in `if` blocks",
                        program[ip].origin.clone(),
                    ));
                }
                // A failing `if` jumps past the `else` into the else-branch.
                program[if_ip].operand = (ip + 1) as i64;
                blocks.push(ip);
            }
            OpKind::Do => {
                let while_ip = blocks
                    .pop()
                    .ok_or_else(|| open_block_error("`do`", &program[ip]))?;
                if program[while_ip].kind != OpKind::While {
                    return Err(Error::semantic(
                        "`do` can only be used in `while` blocks",
                        program[ip].origin.clone(),
                    ));
                }
                // Remember the loop head here until the closing `end` claims it.
                program[ip].operand = while_ip as i64;
                blocks.push(ip);
            }
            OpKind::End => {
                let block_ip = blocks
                    .pop()
                    .ok_or_else(|| open_block_error("`end`", &program[ip]))?;
                match program[block_ip].kind {
                    OpKind::If | OpKind::Else => {
                        program[block_ip].operand = ip as i64;
                        program[ip].operand = (ip + 1) as i64;
                    }
                    OpKind::Do => {
                        program[ip].operand = program[block_ip].operand;
                        program[block_ip].operand = (ip + 1) as i64;
                    }
                    _ => {
                        return Err(Error::semantic(
                            "`end` can only close `if` and `while` blocks",
                            program[ip].origin.clone(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
    if let Some(&open_ip) = blocks.last() {
        return Err(Error::semantic(
            format!("unclosed `{}` block", program[open_ip].kind),
            program[open_ip].origin.clone(),
        ));
    }
    Ok(program)
}

fn open_block_error(word: &str, op: &Op) -> Error {
    Error::semantic(
        format!("{} without an open block", word),
        op.origin.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_source;
    use crate::parser::parse_tokens;
    use std::path::Path;

    fn crossref(source: &str) -> Result<Vec<Op>, Error> {
        let tokens = lex_source(Path::new("test.porth"), source);
        cross_reference_blocks(parse_tokens(&tokens).unwrap())
    }

    fn semantic_message(err: Error) -> String {
        match err {
            Error::Semantic { message, .. } => message,
            other => panic!("expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_if_end() {
        // 0:1  1:if  2:2  3:print  4:end
        let program = crossref("1 if 2 print end").unwrap();
        assert_eq!(program[1].operand, 4); // failing `if` jumps to `end`
        assert_eq!(program[4].operand, 5); // `end` falls through
    }

    #[test]
    fn test_if_else_end() {
        // 0:1  1:if  2:2  3:print  4:else  5:3  6:print  7:end
        let program = crossref("1 if 2 print else 3 print end").unwrap();
        assert_eq!(program[1].operand, 5); // past the `else`
        assert_eq!(program[4].operand, 7); // `else` jumps to the `end` label
        assert_eq!(program[7].operand, 8);
    }

    #[test]
    fn test_while_do_end() {
        // 0:0  1:while  2:dup  3:3  4:<  5:do  6:dup  7:print  8:1  9:+  10:end  11:drop
        let program = crossref("0 while dup 3 < do dup print 1 + end drop").unwrap();
        assert_eq!(program[5].operand, 11); // failing `do` exits past `end`
        assert_eq!(program[10].operand, 1); // `end` loops back to `while`
        assert_eq!(program[1].operand, 0); // `while` itself is only a label
    }

    #[test]
    fn test_nested_blocks() {
        // 0:1  1:if  2:1  3:if  4:1  5:print  6:end  7:end
        let program = crossref("1 if 1 if 1 print end end").unwrap();
        assert_eq!(program[3].operand, 6);
        assert_eq!(program[1].operand, 7);
        assert_eq!(program[6].operand, 7);
        assert_eq!(program[7].operand, 8);
    }

    #[test]
    fn test_loop_inside_conditional() {
        // 0:1  1:if  2:0  3:while  4:dup  5:0  6:>  7:do  8:1  9:-  10:end  11:drop  12:end
        let program = crossref("1 if 0 while dup 0 > do 1 - end drop end").unwrap();
        assert_eq!(program[1].operand, 12);
        assert_eq!(program[7].operand, 11);
        assert_eq!(program[10].operand, 3);
    }

    #[test]
    fn test_target_integrity() {
        let source = "1 if 2 print else 3 print end 0 while dup 3 < do dup print 1 + end drop";
        let program = crossref(source).unwrap();
        let len = program.len() as i64;
        for op in &program {
            match op.kind {
                OpKind::If | OpKind::Else | OpKind::End | OpKind::Do => {
                    assert!(
                        (0..=len).contains(&op.operand),
                        "{} target {} out of [0, {}]",
                        op.kind,
                        op.operand,
                        len
                    );
                }
                OpKind::Push => {}
                _ => assert_eq!(op.operand, 0, "{} must carry no target", op.kind),
            }
        }
    }

    #[test]
    fn test_bare_end_is_semantic_error() {
        let message = semantic_message(crossref("end").unwrap_err());
        assert!(message.contains("`end`"));
    }

    #[test]
    fn test_end_closing_while_without_do_is_rejected() {
        let message = semantic_message(crossref("while end").unwrap_err());
        assert!(message.contains("can only close"));
    }

    #[test]
    fn test_else_without_if() {
        let message = semantic_message(crossref("1 else end").unwrap_err());
        assert!(message.contains("`else`"));
    }

    #[test]
    fn test_else_closing_while_is_rejected() {
        let message = semantic_message(crossref("while else").unwrap_err());
        assert!(message.contains("`else`"));
    }

    #[test]
    fn test_do_without_while() {
        let message = semantic_message(crossref("1 do end").unwrap_err());
        assert!(message.contains("`do`"));
    }

    #[test]
    fn test_unclosed_block() {
        let err = crossref("1 if 2 print").unwrap_err();
        match err {
            Error::Semantic { message, location } => {
                assert!(message.contains("unclosed"));
                // Points at the `if` that was never closed.
                assert_eq!(location.unwrap().column, 3);
            }
            other => panic!("expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_well_formed_program_empties_block_stack() {
        // Succeeding at all means the residue check passed; spot-check a
        // deeply nested mix.
        assert!(crossref("1 if 0 while 1 do 1 if else end end end").is_ok());
    }
}
