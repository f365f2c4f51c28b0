//! Equivalence test runner.
//!
//! Discovers `.porth` files, simulates each one in-process, then compiles it
//! with the host toolchain and runs the executable. A file passes when both
//! stdouts are byte-identical. This is the contract between the simulator
//! and the code generator.

use crate::config::CompilerConfig;
use crate::sim::simulate_program;
use crate::{compile_file, load_program_from_file};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of checking a single file.
#[derive(Debug)]
pub struct TestOutcome {
    pub path: PathBuf,
    pub passed: bool,
    /// Failure explanation, including both outputs on a discrepancy.
    pub detail: Option<String>,
}

/// Summary of a whole run.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<TestOutcome>,
}

/// Test runner configuration.
pub struct TestRunner {
    /// Show per-file output even on success.
    pub verbose: bool,
    /// Only check files whose name contains this pattern.
    pub filter: Option<String>,
    pub config: CompilerConfig,
}

impl TestRunner {
    pub fn new(verbose: bool, filter: Option<String>) -> Self {
        TestRunner {
            verbose,
            filter,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Find `.porth` files under the given paths, recursively, sorted.
    pub fn discover_test_files(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_file() {
                if self.is_test_file(path) {
                    files.push(path.clone());
                }
            } else if path.is_dir() {
                self.discover_in_directory(path, &mut files);
            }
        }
        files.sort();
        files
    }

    fn is_test_file(&self, path: &Path) -> bool {
        let is_porth = path.extension().is_some_and(|e| e == "porth");
        is_porth && self.matches_filter(path)
    }

    fn matches_filter(&self, path: &Path) -> bool {
        match &self.filter {
            Some(pattern) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.contains(pattern.as_str())),
            None => true,
        }
    }

    fn discover_in_directory(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && self.is_test_file(&path) {
                    files.push(path);
                } else if path.is_dir() {
                    self.discover_in_directory(&path, files);
                }
            }
        }
    }

    /// Check one file: simulate, compile, run, compare stdout.
    pub fn run_file(&self, path: &Path) -> TestOutcome {
        match self.check_equivalence(path) {
            Ok(()) => TestOutcome {
                path: path.to_path_buf(),
                passed: true,
                detail: None,
            },
            Err(detail) => TestOutcome {
                path: path.to_path_buf(),
                passed: false,
                detail: Some(detail),
            },
        }
    }

    fn check_equivalence(&self, path: &Path) -> Result<(), String> {
        let program = load_program_from_file(path).map_err(|e| e.to_string())?;

        let mut sim_stdout = Vec::new();
        let mut sim_stderr = Vec::new();
        simulate_program(&program, &mut sim_stdout, &mut sim_stderr, false)
            .map_err(|e| e.to_string())?;

        let file_id = sanitize_name(&path.to_string_lossy());
        let binary_path = env::temp_dir().join(format!("porth_test_{}", file_id));

        compile_file(path, &binary_path, &self.config).map_err(|e| e.to_string())?;

        let output = Command::new(&binary_path)
            .output()
            .map_err(|e| format!("failed to run {}: {}", binary_path.display(), e));
        fs::remove_file(&binary_path).ok();
        let output = output?;

        if !output.status.success() {
            return Err(format!(
                "compiled executable exited with {:?}:\n{}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        if output.stdout != sim_stdout {
            return Err(discrepancy_report(&sim_stdout, &output.stdout));
        }
        Ok(())
    }

    /// Check every discovered file and collect a summary.
    pub fn run(&self, paths: &[PathBuf]) -> TestSummary {
        let mut summary = TestSummary::default();
        for path in self.discover_test_files(paths) {
            let outcome = self.run_file(&path);
            summary.total += 1;
            if outcome.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary.outcomes.push(outcome);
        }
        summary
    }

    /// Print results in the usual `name ... ok` form plus a summary block.
    pub fn print_results(&self, summary: &TestSummary) {
        for outcome in &summary.outcomes {
            let status = if outcome.passed { "ok" } else { "FAILED" };
            if self.verbose || !outcome.passed {
                println!("  {} ... {}", outcome.path.display(), status);
            }
        }

        println!("\n========================================");
        println!(
            "Results: {} passed, {} failed",
            summary.passed, summary.failed
        );

        let failures: Vec<_> = summary.outcomes.iter().filter(|o| !o.passed).collect();
        if !failures.is_empty() {
            println!("\nFAILURES:\n");
            for outcome in failures {
                println!("{}", outcome.path.display());
                if let Some(ref detail) = outcome.detail {
                    for line in detail.lines() {
                        println!("  {}", line);
                    }
                }
                println!();
            }
        }
    }
}

fn discrepancy_report(sim_stdout: &[u8], com_stdout: &[u8]) -> String {
    let mut report = String::from("output discrepancy between simulation and compilation\n");
    report.push_str("simulation output:\n");
    for line in String::from_utf8_lossy(sim_stdout).lines() {
        report.push_str("    ");
        report.push_str(line);
        report.push('\n');
    }
    report.push_str("compilation output:\n");
    for line in String::from_utf8_lossy(com_stdout).lines() {
        report.push_str("    ");
        report.push_str(line);
        report.push('\n');
    }
    report
}

/// Sanitize a path for use as a temp-file name.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_is_test_file() {
        let runner = TestRunner::new(false, None);
        assert!(runner.is_test_file(Path::new("loops.porth")));
        assert!(runner.is_test_file(Path::new("dir/arith.porth")));
        assert!(!runner.is_test_file(Path::new("loops.txt")));
        assert!(!runner.is_test_file(Path::new("porth")));
    }

    #[test]
    fn test_filter_matches_file_name() {
        let runner = TestRunner::new(false, Some("loop".to_string()));
        assert!(runner.is_test_file(Path::new("loops.porth")));
        assert!(!runner.is_test_file(Path::new("arith.porth")));
    }

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        for path in [
            dir.path().join("b.porth"),
            dir.path().join("a.porth"),
            nested.join("c.porth"),
            dir.path().join("ignored.txt"),
        ] {
            fs::File::create(&path).unwrap();
        }

        let runner = TestRunner::new(false, None);
        let files = runner.discover_test_files(&[dir.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.porth"),
                PathBuf::from("b.porth"),
                PathBuf::from("nested/c.porth"),
            ]
        );
    }

    #[test]
    fn test_run_file_fails_on_bad_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.porth");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"end").unwrap();

        let runner = TestRunner::new(false, None);
        let outcome = runner.run_file(&path);
        assert!(!outcome.passed);
        assert!(outcome.detail.unwrap().contains("semantic error"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("tests/loops.porth"), "tests_loops_porth");
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.porth");
        fs::write(&path, "end").unwrap();

        let runner = TestRunner::new(false, None);
        let summary = runner.run(&[dir.path().to_path_buf()]);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.passed, 0);
    }
}
