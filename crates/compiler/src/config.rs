//! Compiler configuration.
//!
//! Controls how the emitted translation unit is handed to the host C++
//! toolchain. Defaults work out of the box; a TOML file can override the
//! compiler executable and add extra flags:
//!
//! ```toml
//! [toolchain]
//! compiler = "clang++"
//! flags = ["-march=native"]
//! ```

use crate::error::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Host C++ toolchain settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    /// C++ compiler executable to invoke.
    pub compiler: String,
    /// Extra flags appended after the built-in ones.
    pub flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            compiler: "c++".to_string(),
            flags: Vec::new(),
        }
    }
}

/// Configuration for one compiler invocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub toolchain: ToolchainConfig,
    /// Keep the intermediate `.cpp` file after building.
    pub keep_cpp: bool,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Error> {
        toml::from_str(toml_str).map_err(|e| Error::Config {
            message: format!("failed to parse config: {}", e),
        })
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config {}", path.display()), e))?;
        Self::from_toml_str(&content)
    }

    /// Override the compiler executable (builder pattern).
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.toolchain.compiler = compiler.into();
        self
    }

    /// Append a toolchain flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.toolchain.flags.push(flag.into());
        self
    }

    /// Keep the intermediate C++ file.
    pub fn with_keep_cpp(mut self, keep: bool) -> Self {
        self.keep_cpp = keep;
        self
    }
}
