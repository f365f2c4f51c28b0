//! Porth compiler CLI
//!
//! Command-line interface for simulating .porth programs, compiling them to
//! native executables through the host C++ toolchain, and checking that both
//! back ends agree.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use porthc::test_runner::TestRunner;
use porthc::{CompilerConfig, Error};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "porthc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Porth compiler - simulate or compile .porth programs", long_about = None)]
struct Cli {
    /// Dump the start of simulator memory after a successful run
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a .porth file
    Sim {
        /// Input .porth source file
        input: PathBuf,
    },

    /// Compile a .porth file to a native executable
    Com {
        /// Input .porth source file
        input: PathBuf,

        /// Output executable path (defaults to input filename without .porth extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the executable after building it
        #[arg(short, long)]
        run: bool,

        /// Keep the intermediate C++ translation unit (.cpp)
        #[arg(long)]
        keep_cpp: bool,

        /// Path to toolchain configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that simulation and compilation agree for .porth files
    Test {
        /// Directories or files to test (defaults to current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Filter: only check files whose name matches this pattern
        #[arg(short, long)]
        filter: Option<String>,

        /// Verbose output (list passing files too)
        #[arg(short, long)]
        verbose: bool,

        /// Path to toolchain configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sim { input } => {
            run_sim(&input, cli.debug);
        }
        Commands::Com {
            input,
            output,
            run,
            keep_cpp,
            config,
        } => {
            let output = output.unwrap_or_else(|| {
                // Default: input filename without the .porth extension
                let stem = input.file_stem().unwrap_or_default();
                PathBuf::from(stem)
            });
            run_com(&input, &output, run, keep_cpp, config.as_deref());
        }
        Commands::Test {
            paths,
            filter,
            verbose,
            config,
        } => {
            run_test(&paths, filter, verbose, config.as_deref());
        }
        Commands::Completions { shell } => {
            run_completions(shell);
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "porthc", &mut io::stdout());
}

fn run_sim(input: &Path, debug: bool) {
    if let Err(e) = porthc::simulate_file(input, debug) {
        fail(e);
    }
}

fn run_com(input: &Path, output: &Path, run: bool, keep_cpp: bool, config_path: Option<&Path>) {
    let config = load_config(config_path).with_keep_cpp(keep_cpp);

    if let Err(e) = porthc::compile_file(input, output, &config) {
        fail(e);
    }
    println!("Compiled {} -> {}", input.display(), output.display());
    if keep_cpp {
        let cpp_path = output.with_extension("cpp");
        if cpp_path.exists() {
            println!("C++ saved to {}", cpp_path.display());
        }
    }

    if run {
        match porthc::run_executable(output) {
            Ok(code) if code != 0 => process::exit(code),
            Ok(_) => {}
            Err(e) => fail(e),
        }
    }
}

fn run_test(paths: &[PathBuf], filter: Option<String>, verbose: bool, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let runner = TestRunner::new(verbose, filter).with_config(config);
    let summary = runner.run(paths);
    runner.print_results(&summary);

    if summary.failed > 0 {
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> CompilerConfig {
    match path {
        Some(path) => match CompilerConfig::load(path) {
            Ok(config) => config,
            Err(e) => fail(e),
        },
        None => CompilerConfig::default(),
    }
}

fn fail(e: Error) -> ! {
    eprintln!("Error: {}", e);
    process::exit(e.exit_code());
}
