//! Stack-machine simulator.
//!
//! Interprets a cross-referenced program against a value stack and a fixed
//! byte memory region. Output goes through the supplied writers so the test
//! runner can capture it; the driver passes the process streams.

use crate::error::Error;
use crate::ops::{Op, OpKind};
use std::io::Write;

/// Size of the linear byte memory pushed by `mem` as address 0.
pub const MEM_CAPACITY: usize = 640_000;

/// Bytes shown by the debug-mode memory dump.
const DUMP_LEN: usize = 20;

/// Run the program to completion.
///
/// `print` and `syscall3` with fd 1 write to `stdout`; `syscall3` with fd 2
/// writes to `stderr`. With `debug` set, a dump of the first memory bytes
/// follows normal termination.
pub fn simulate_program(
    program: &[Op],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    debug: bool,
) -> Result<(), Error> {
    let mut stack: Vec<i64> = Vec::new();
    let mut mem = vec![0u8; MEM_CAPACITY];
    // Execution is not linear, so the loop advances an explicit ip.
    let mut ip = 0;
    while ip < program.len() {
        let op = &program[ip];
        match op.kind {
            OpKind::Push => {
                stack.push(op.operand);
                ip += 1;
            }
            OpKind::Plus => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a.wrapping_add(b));
                ip += 1;
            }
            OpKind::Minus => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a.wrapping_sub(b));
                ip += 1;
            }
            OpKind::Mod => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                if b == 0 {
                    return Err(Error::simulation("mod: division by zero"));
                }
                stack.push(a.wrapping_rem(b));
                ip += 1;
            }
            OpKind::Eq => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a == b) as i64);
                ip += 1;
            }
            OpKind::Ne => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a != b) as i64);
                ip += 1;
            }
            OpKind::Gt => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a > b) as i64);
                ip += 1;
            }
            OpKind::Lt => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a < b) as i64);
                ip += 1;
            }
            OpKind::Ge => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a >= b) as i64);
                ip += 1;
            }
            OpKind::Le => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push((a <= b) as i64);
                ip += 1;
            }
            OpKind::Shr => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                // Shift count is taken modulo 64, as on the usual targets.
                stack.push(a.wrapping_shr(b as u32));
                ip += 1;
            }
            OpKind::Shl => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a.wrapping_shl(b as u32));
                ip += 1;
            }
            OpKind::Bor => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a | b);
                ip += 1;
            }
            OpKind::Band => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a & b);
                ip += 1;
            }
            OpKind::Dup => {
                let a = peek(&stack)?;
                stack.push(a);
                ip += 1;
            }
            OpKind::Dup2 => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a);
                stack.push(b);
                stack.push(a);
                stack.push(b);
                ip += 1;
            }
            OpKind::Swap => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(b);
                stack.push(a);
                ip += 1;
            }
            OpKind::Drop => {
                pop(&mut stack)?;
                ip += 1;
            }
            OpKind::Over => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(a);
                stack.push(b);
                stack.push(a);
                ip += 1;
            }
            OpKind::If | OpKind::Do => {
                let a = pop(&mut stack)?;
                if a == 0 {
                    ip = op.operand as usize;
                } else {
                    ip += 1;
                }
            }
            OpKind::Else | OpKind::End => {
                ip = op.operand as usize;
            }
            OpKind::While => {
                ip += 1;
            }
            OpKind::Mem => {
                stack.push(0);
                ip += 1;
            }
            OpKind::Load => {
                let a = pop(&mut stack)?;
                let addr = a as usize;
                if addr >= MEM_CAPACITY {
                    return Err(Error::simulation(format!(
                        "load: invalid memory address {}",
                        addr
                    )));
                }
                stack.push(i64::from(mem[addr]));
                ip += 1;
            }
            OpKind::Store => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                let addr = a as usize;
                if addr >= MEM_CAPACITY {
                    return Err(Error::simulation(format!(
                        "store: invalid memory address {}",
                        addr
                    )));
                }
                mem[addr] = b as u8;
                ip += 1;
            }
            OpKind::Print => {
                // Leaves its operand on the stack.
                let a = peek(&stack)?;
                writeln!(stdout, "{}", a).map_err(write_failed)?;
                ip += 1;
            }
            OpKind::Syscall1 => return Err(Error::simulation("syscall1: unimplemented")),
            OpKind::Syscall2 => return Err(Error::simulation("syscall2: unimplemented")),
            OpKind::Syscall3 => {
                // The syscall number sits on top, above its arguments.
                let syscall_number = pop(&mut stack)?;
                let arg1 = pop(&mut stack)?;
                let arg2 = pop(&mut stack)?;
                let arg3 = pop(&mut stack)?;
                if syscall_number != 1 {
                    return Err(Error::simulation(format!(
                        "syscall3: unknown syscall {}",
                        syscall_number
                    )));
                }
                let (fd, buf, count) = (arg1, arg2 as usize, arg3 as usize);
                let bytes = buf
                    .checked_add(count)
                    .and_then(|end| mem.get(buf..end))
                    .ok_or_else(|| {
                        Error::simulation(format!(
                            "syscall3: buffer [{}, {}) out of range",
                            arg2,
                            arg2.wrapping_add(arg3)
                        ))
                    })?;
                match fd {
                    1 => stdout.write_all(bytes).map_err(write_failed)?,
                    2 => stderr.write_all(bytes).map_err(write_failed)?,
                    _ => {
                        return Err(Error::simulation(format!(
                            "syscall3: unknown file descriptor {}",
                            fd
                        )));
                    }
                }
                ip += 1;
            }
            OpKind::Syscall4 => return Err(Error::simulation("syscall4: unimplemented")),
            OpKind::Syscall5 => return Err(Error::simulation("syscall5: unimplemented")),
            OpKind::Syscall6 => return Err(Error::simulation("syscall6: unimplemented")),
        }
    }
    if debug {
        writeln!(stdout, "[INFO] Memory dump").map_err(write_failed)?;
        stdout.write_all(&mem[..DUMP_LEN]).map_err(write_failed)?;
        writeln!(stdout).map_err(write_failed)?;
    }
    Ok(())
}

fn pop(stack: &mut Vec<i64>) -> Result<i64, Error> {
    stack.pop().ok_or_else(|| Error::simulation("stack underflow"))
}

fn peek(stack: &[i64]) -> Result<i64, Error> {
    stack
        .last()
        .copied()
        .ok_or_else(|| Error::simulation("stack underflow"))
}

fn write_failed(e: std::io::Error) -> Error {
    Error::io("failed to write simulator output", e)
}
