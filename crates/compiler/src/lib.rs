//! Porth compiler library.
//!
//! Porth is a small concatenative, stack-oriented language. Programs are
//! whitespace-separated words and integer literals operating on a value
//! stack and a fixed byte memory region. Two back ends share one front end:
//!
//! - the **simulator** interprets the program directly, and
//! - the **compiler** emits an equivalent C++ translation unit and hands it
//!   to the host C++ toolchain.
//!
//! The pipeline is a straight line: [`lexer`] produces tokens, [`parser`]
//! turns them into ops, [`crossref`] resolves structured control flow into
//! jump targets, then either [`sim`] executes or [`codegen`] emits C++.
//!
//! ```rust,ignore
//! use porthc::{load_program_from_file, simulate_program};
//!
//! let program = load_program_from_file(Path::new("examples.porth"))?;
//! simulate_program(&program, &mut stdout, &mut stderr, false)?;
//! ```

pub mod codegen;
pub mod config;
pub mod crossref;
pub mod error;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod sim;
pub mod test_runner;

pub use codegen::CppCodeGen;
pub use config::{CompilerConfig, ToolchainConfig};
pub use crossref::cross_reference_blocks;
pub use error::Error;
pub use lexer::{lex_file, lex_source, Token};
pub use ops::{Op, OpKind, SourceLocation, OP_KIND_COUNT};
pub use parser::{parse_tokens, BUILTIN_WORDS};
pub use sim::{simulate_program, MEM_CAPACITY};

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// Cache for the toolchain availability probe; it only runs once per process.
static TOOLCHAIN_CHECKED: OnceLock<Result<(), String>> = OnceLock::new();

/// Lex, parse, and cross-reference a source file into a runnable program.
pub fn load_program_from_file(path: &Path) -> Result<Vec<Op>, Error> {
    let tokens = lexer::lex_file(path)?;
    let program = parser::parse_tokens(&tokens)?;
    crossref::cross_reference_blocks(program)
}

/// Same pipeline over an in-memory source string. `path` is only used for
/// diagnostics.
pub fn load_program_from_source(path: &Path, source: &str) -> Result<Vec<Op>, Error> {
    let tokens = lexer::lex_source(path, source);
    let program = parser::parse_tokens(&tokens)?;
    crossref::cross_reference_blocks(program)
}

/// Simulate a source file against the process streams.
pub fn simulate_file(path: &Path, debug: bool) -> Result<(), Error> {
    let program = load_program_from_file(path)?;
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    sim::simulate_program(&program, &mut stdout, &mut stderr, debug)
}

/// Compile a source file to a native executable.
///
/// Emits the C++ translation unit next to the output (`<output>.cpp`),
/// invokes the configured C++ compiler, and removes the intermediate file
/// unless `config.keep_cpp` is set.
pub fn compile_file(source_path: &Path, output_path: &Path, config: &CompilerConfig) -> Result<(), Error> {
    let program = load_program_from_file(source_path)?;
    let cpp_source = CppCodeGen::new().generate(&program)?;

    let cpp_path = output_path.with_extension("cpp");
    fs::write(&cpp_path, cpp_source)
        .map_err(|e| Error::io(format!("failed to write {}", cpp_path.display()), e))?;

    check_toolchain(&config.toolchain.compiler)?;
    let result = build_executable(&cpp_path, output_path, config);

    if !config.keep_cpp {
        fs::remove_file(&cpp_path).ok();
    }
    result
}

/// Check that the configured C++ compiler can be run at all.
fn check_toolchain(compiler: &str) -> Result<(), Error> {
    TOOLCHAIN_CHECKED
        .get_or_init(|| {
            let output = Command::new(compiler).arg("--version").output().map_err(|e| {
                format!(
                    "failed to run {}: {}. Install a C++20 compiler or point \
                     [toolchain] compiler at one.",
                    compiler, e
                )
            })?;
            if !output.status.success() {
                return Err(format!(
                    "{} --version failed with exit code {:?}",
                    compiler,
                    output.status.code()
                ));
            }
            Ok(())
        })
        .clone()
        .map_err(|message| Error::Toolchain { message })
}

/// Invoke the host C++ compiler on an emitted translation unit.
pub fn build_executable(
    cpp_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), Error> {
    let mut command = Command::new(&config.toolchain.compiler);
    command.arg("-w").arg("-std=c++20").arg("-O2");
    for flag in &config.toolchain.flags {
        command.arg(flag);
    }
    command.arg(cpp_path).arg("-o").arg(output_path);

    let output = command.output().map_err(|e| {
        Error::toolchain(format!(
            "failed to run {}: {}",
            config.toolchain.compiler, e
        ))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::toolchain(format!(
            "{} failed:\n{}",
            config.toolchain.compiler, stderr
        )));
    }
    Ok(())
}

/// Run a built executable with inherited stdio and report its exit code.
pub fn run_executable(path: &Path) -> Result<i32, Error> {
    let status = Command::new(path)
        .status()
        .map_err(|e| Error::io(format!("failed to run {}", path.display()), e))?;
    // A signal-terminated child has no code; report generic failure.
    Ok(status.code().unwrap_or(1))
}
