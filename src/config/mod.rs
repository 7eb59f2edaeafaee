//! Run configuration
//!
//! Fixed defaults with environment variable overrides.

use std::env;
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "PARTEST";

/// Default path of the coverage instrumentation tool.
const DEFAULT_INSTRUMENT_TOOL: &str = r"C:\Program Files (x86)\Microsoft Visual Studio 14.0\Team Tools\Performance Tools\vsinstr.exe";

/// Default directory the per-unit report files are named into.
const DEFAULT_REPORT_DIR: &str = "TestResults";

/// Run-wide configuration
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Coverage tool invoked for --instrument:true directories.
    pub instrument_tool: PathBuf,
    /// Directory the test binaries write their report files into.
    pub report_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            instrument_tool: PathBuf::from(DEFAULT_INSTRUMENT_TOOL),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl RunConfig {
    /// Load configuration, letting PARTEST_INSTRUMENT_TOOL and
    /// PARTEST_REPORT_DIR override the defaults.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            instrument_tool: get_env("INSTRUMENT_TOOL")
                .map(PathBuf::from)
                .unwrap_or(defaults.instrument_tool),
            report_dir: get_env("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}
