//! Error types for partest

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for partest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for partest
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized `--option:value` modifier on the command line.
    #[error("Unknown option {0}")]
    UnknownOption(String),

    /// A recognized modifier carried a value that does not parse.
    #[error("Invalid value '{value}' for option {option}")]
    InvalidOptionValue { option: String, value: String },

    /// A test binary or external tool could not be started.
    #[error("Failed to launch {}: {source}", .binary.display())]
    Launch {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A test binary's listing output could not be understood.
    #[error("Unparsable test listing from {}: {reason}", .binary.display())]
    Listing { binary: PathBuf, reason: String },

    /// A death test unit exited with a non-zero status.
    #[error("Exit code {code} from death test ({index}) {} --gtest_filter={filter}", .binary.display())]
    DeathTestFailed {
        code: i32,
        index: usize,
        binary: PathBuf,
        filter: String,
    },

    /// A parallel unit exited with a non-zero status.
    #[error("Exit code {code} from ({index}) {} --gtest_filter={filter}", .binary.display())]
    UnitFailed {
        code: i32,
        index: usize,
        binary: PathBuf,
        filter: String,
    },

    /// A worker task died before reporting its unit's outcome.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Exit status this error propagates to the operator. Unit failures
    /// forward the unit's own code verbatim; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DeathTestFailed { code, .. } | Error::UnitFailed { code, .. } => *code,
            _ => 1,
        }
    }
}
