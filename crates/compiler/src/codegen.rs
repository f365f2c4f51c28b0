//! C++ code generation.
//!
//! Lowers a cross-referenced program to one self-contained C++20 translation
//! unit that uses only the standard library. Every op index becomes a
//! `_porth_addr_<ip>` label and control flow becomes `goto`, so the built
//! executable's stdout matches the simulator byte for byte.
//!
//! One peephole: an `end` whose target is the next instruction emits only
//! its label, no `goto`.

use crate::error::Error;
use crate::ops::{Op, OpKind};
use crate::sim::MEM_CAPACITY;

/// Generator for the C++ translation unit.
///
/// Owns the output buffer and the current indent level; `generate` consumes
/// the generator and returns the finished source text.
pub struct CppCodeGen {
    output: String,
    indent: usize,
}

impl Default for CppCodeGen {
    fn default() -> Self {
        CppCodeGen::new()
    }
}

impl CppCodeGen {
    pub fn new() -> Self {
        CppCodeGen {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn generate(mut self, program: &[Op]) -> Result<String, Error> {
        self.output.push_str("#include <array>\n");
        self.output.push_str("#include <cstdint>\n");
        self.output.push_str("#include <iostream>\n");
        self.output.push_str("#include <stack>\n");
        self.emit("int main() {");
        self.indent += 1;
        self.emit(&format!(
            "std::array<std::uint8_t, {}> mem{{}};",
            MEM_CAPACITY
        ));
        self.emit("std::stack<std::int64_t> _porth_stack;");
        for (ip, op) in program.iter().enumerate() {
            self.emit(&format!("// -- {} --", op.kind.name()));
            self.label(ip as i64);
            self.codegen_op(ip, op)?;
        }
        self.label(program.len() as i64);
        self.emit("return 0;");
        self.indent -= 1;
        self.emit("}");
        Ok(self.output)
    }

    fn codegen_op(&mut self, ip: usize, op: &Op) -> Result<(), Error> {
        match op.kind {
            OpKind::Push => {
                self.emit(&format!("_porth_stack.push({});", op.operand));
            }
            OpKind::Plus => self.binary_op("a + b"),
            OpKind::Minus => self.binary_op("a - b"),
            OpKind::Mod => self.binary_op("a % b"),
            OpKind::Eq => self.binary_op("a == b ? 1 : 0"),
            OpKind::Ne => self.binary_op("a != b ? 1 : 0"),
            OpKind::Gt => self.binary_op("a > b ? 1 : 0"),
            OpKind::Lt => self.binary_op("a < b ? 1 : 0"),
            OpKind::Ge => self.binary_op("a >= b ? 1 : 0"),
            OpKind::Le => self.binary_op("a <= b ? 1 : 0"),
            OpKind::Shr => self.binary_op("a >> b"),
            OpKind::Shl => self.binary_op("a << b"),
            OpKind::Bor => self.binary_op("a | b"),
            OpKind::Band => self.binary_op("a & b"),
            OpKind::Dup => {
                self.open_block();
                self.emit("auto a = _porth_stack.top();");
                self.emit("_porth_stack.push(a);");
                self.close_block();
            }
            OpKind::Dup2 => {
                self.open_block();
                self.pop_two();
                self.emit("_porth_stack.push(a);");
                self.emit("_porth_stack.push(b);");
                self.emit("_porth_stack.push(a);");
                self.emit("_porth_stack.push(b);");
                self.close_block();
            }
            OpKind::Swap => {
                self.open_block();
                self.pop_two();
                self.emit("_porth_stack.push(b);");
                self.emit("_porth_stack.push(a);");
                self.close_block();
            }
            OpKind::Drop => {
                self.emit("_porth_stack.pop();");
            }
            OpKind::Over => {
                self.open_block();
                self.pop_two();
                self.emit("_porth_stack.push(a);");
                self.emit("_porth_stack.push(b);");
                self.emit("_porth_stack.push(a);");
                self.close_block();
            }
            OpKind::If | OpKind::Do => self.conditional_jump(op.operand),
            OpKind::Else => {
                self.emit(&format!("goto {};", label_name(op.operand)));
            }
            OpKind::End => {
                // Fall-through `end` needs only its label.
                if op.operand != ip as i64 + 1 {
                    self.emit(&format!("goto {};", label_name(op.operand)));
                }
            }
            OpKind::While => {
                // Nothing. Just an anchor for the condition.
            }
            OpKind::Mem => {
                self.emit("_porth_stack.push(0);");
            }
            OpKind::Load => {
                self.open_block();
                self.emit("auto a = _porth_stack.top();");
                self.emit("_porth_stack.pop();");
                self.emit("auto addr = static_cast<std::size_t>(a);");
                self.emit("auto b = mem.at(addr);");
                self.emit("_porth_stack.push(static_cast<std::int64_t>(b));");
                self.close_block();
            }
            OpKind::Store => {
                self.open_block();
                self.pop_two();
                self.emit("auto addr = static_cast<std::size_t>(a);");
                self.emit("mem.at(addr) = static_cast<std::uint8_t>(b);");
                self.close_block();
            }
            OpKind::Print => {
                self.emit("std::cout << _porth_stack.top() << \"\\n\";");
            }
            OpKind::Syscall3 => self.syscall3(),
            OpKind::Syscall1
            | OpKind::Syscall2
            | OpKind::Syscall4
            | OpKind::Syscall5
            | OpKind::Syscall6 => {
                return Err(Error::Codegen {
                    message: format!("not implemented: {}", op.kind),
                });
            }
        }
        Ok(())
    }

    /// Pop `b` then `a` and push the given expression over them.
    fn binary_op(&mut self, expr: &str) {
        self.open_block();
        self.pop_two();
        self.emit(&format!("_porth_stack.push({});", expr));
        self.close_block();
    }

    /// Pop the condition and jump when it is zero.
    fn conditional_jump(&mut self, target: i64) {
        self.open_block();
        self.emit("auto a = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("if (a == 0) {");
        self.indent += 1;
        self.emit(&format!("goto {};", label_name(target)));
        self.indent -= 1;
        self.emit("}");
        self.close_block();
    }

    fn syscall3(&mut self) {
        self.open_block();
        self.emit("auto syscallNumber = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("auto arg1 = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("auto arg2 = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("auto arg3 = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("if (syscallNumber == 1) {");
        self.indent += 1;
        self.emit("auto fd = arg1;");
        self.emit("auto buf = arg2;");
        self.emit("auto count = arg3;");
        self.emit("const std::string_view s = {");
        self.indent += 1;
        self.emit("reinterpret_cast<const char*>(&mem[buf]),");
        self.emit("static_cast<std::size_t>(count),");
        self.indent -= 1;
        self.emit("};");
        self.emit("if (fd == 1) {");
        self.indent += 1;
        self.emit("std::cout << s;");
        self.indent -= 1;
        self.emit("} else if (fd == 2) {");
        self.indent += 1;
        self.emit("std::cerr << s;");
        self.indent -= 1;
        self.emit("} else {");
        self.indent += 1;
        self.emit("std::cerr << \"syscall3: unknown file descriptor \" << fd;");
        self.emit("return 1;");
        self.indent -= 1;
        self.emit("}");
        self.indent -= 1;
        self.emit("} else {");
        self.indent += 1;
        self.emit("std::cerr << \"syscall3: unknown syscall \" << syscallNumber;");
        self.emit("return 1;");
        self.indent -= 1;
        self.emit("}");
        self.close_block();
    }

    fn pop_two(&mut self) {
        self.emit("auto b = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
        self.emit("auto a = _porth_stack.top();");
        self.emit("_porth_stack.pop();");
    }

    fn open_block(&mut self) {
        self.emit("{");
        self.indent += 1;
    }

    fn close_block(&mut self) {
        self.indent -= 1;
        self.emit("}");
    }

    /// Write an indented statement line.
    fn emit(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Write a label definition at column zero.
    fn label(&mut self, ip: i64) {
        self.output.push_str(&label_name(ip));
        self.output.push_str(":\n");
    }
}

fn label_name(target: i64) -> String {
    format!("_porth_addr_{}", target)
}
