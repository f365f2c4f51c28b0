//! Error types for the compiler and simulator.
//!
//! The pipeline surfaces every failure as one [`Error`] value; nothing is
//! recovered locally. The driver maps each kind to a message and an exit
//! code via [`Error::exit_code`].

use crate::ops::SourceLocation;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// A token that is neither a reserved word nor an integer literal.
    Parse {
        location: SourceLocation,
        word: String,
    },
    /// Mismatched or misnested control flow found while cross-referencing.
    Semantic {
        message: String,
        location: Option<SourceLocation>,
    },
    /// Runtime failure inside the simulator.
    Simulation { message: String },
    /// A program construct the C++ generator does not support.
    Codegen { message: String },
    /// Malformed configuration file.
    Config { message: String },
    /// Filesystem or stream failure.
    Io {
        context: String,
        source: io::Error,
    },
    /// The host C++ compiler could not be run or reported failure.
    Toolchain { message: String },
}

impl Error {
    pub fn semantic(message: impl Into<String>, location: SourceLocation) -> Self {
        Error::Semantic {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn simulation(message: impl Into<String>) -> Self {
        Error::Simulation {
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn toolchain(message: impl Into<String>) -> Self {
        Error::Toolchain {
            message: message.into(),
        }
    }

    /// Process exit code for this error kind.
    ///
    /// The three program-level kinds get distinct codes so scripted callers
    /// can tell them apart; environmental failures share 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parse { .. } => 2,
            Error::Semantic { .. } | Error::Codegen { .. } => 3,
            Error::Simulation { .. } => 4,
            Error::Config { .. } | Error::Io { .. } | Error::Toolchain { .. } => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse { location, word } => {
                write!(
                    f,
                    "{}: parse error: attempt to convert non-integer value: '{}'",
                    location, word
                )
            }
            Error::Semantic { message, location } => match location {
                Some(loc) => write!(f, "{}: semantic error: {}", loc, message),
                None => write!(f, "semantic error: {}", message),
            },
            Error::Simulation { message } => write!(f, "simulation error: {}", message),
            Error::Codegen { message } => write!(f, "code generation error: {}", message),
            Error::Config { message } => write!(f, "config error: {}", message),
            Error::Io { context, source } => write!(f, "{}: {}", context, source),
            Error::Toolchain { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_has_location_and_word() {
        let err = Error::Parse {
            location: SourceLocation::new("prog.porth", 2, 5),
            word: "frobnicate".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("prog.porth:2:5"));
        assert!(msg.contains("attempt to convert non-integer value"));
        assert!(msg.contains("frobnicate"));
    }

    #[test]
    fn test_exit_codes_are_distinct_per_program_error() {
        let parse = Error::Parse {
            location: SourceLocation::new("p", 1, 1),
            word: String::new(),
        };
        let semantic = Error::Semantic {
            message: String::new(),
            location: None,
        };
        let simulation = Error::simulation("x");
        assert_eq!(parse.exit_code(), 2);
        assert_eq!(semantic.exit_code(), 3);
        assert_eq!(simulation.exit_code(), 4);
    }
}
