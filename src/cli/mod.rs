//! CLI argument parsing
//!
//! The clap frame collects the raw trailing arguments; the
//! positional-order-sensitive `--option:value` modifier grammar is
//! resolved here, because each modifier applies only to the next
//! directory argument.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::Granularity;

/// Parallel test runner for GoogleTest-style test suites
#[derive(Parser, Debug)]
#[command(name = "partest")]
#[command(version)]
#[command(about = "Run test binaries concurrently, death tests first")]
pub struct Args {
    /// Directories to scan for test binaries. Each may be preceded by
    /// --granularity:<Package|TestCase|Test> and --instrument:<true|false>
    /// modifiers that apply to that directory only.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub specs: Vec<String>,
}

/// One directory argument with its resolved modifiers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectorySpec {
    pub dir: PathBuf,
    pub granularity: Granularity,
    pub instrument: bool,
}

/// Resolve the modifier grammar. Modifiers may appear in any order
/// before a path and reset to defaults after each path; an argument
/// without the `--option:value` shape is a directory path.
pub fn parse_directory_specs(args: &[String]) -> Result<Vec<DirectorySpec>> {
    let mut specs = Vec::new();
    let mut granularity: Option<Granularity> = None;
    let mut instrument: Option<bool> = None;

    for arg in args {
        if let Some(modifier) = arg.strip_prefix("--") {
            if let Some((option, value)) = modifier.split_once(':') {
                match option {
                    "granularity" => {
                        granularity =
                            Some(Granularity::from_str(value).ok_or_else(|| {
                                Error::InvalidOptionValue {
                                    option: option.to_string(),
                                    value: value.to_string(),
                                }
                            })?);
                    }
                    "instrument" => {
                        instrument = Some(parse_bool(value).ok_or_else(|| {
                            Error::InvalidOptionValue {
                                option: option.to_string(),
                                value: value.to_string(),
                            }
                        })?);
                    }
                    _ => return Err(Error::UnknownOption(option.to_string())),
                }
                continue;
            }
        }
        specs.push(DirectorySpec {
            dir: PathBuf::from(arg),
            granularity: granularity.take().unwrap_or_default(),
            instrument: instrument.take().unwrap_or(false),
        });
    }

    Ok(specs)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
