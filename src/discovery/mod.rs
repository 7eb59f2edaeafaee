//! Test binary discovery
//!
//! Finds test executables in a directory and queries each one for its
//! internal test inventory via the gtest listing protocol.

use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Isolation;

/// File name suffix test binaries must carry (before any `.exe`).
const TEST_BINARY_SUFFIX: &str = "_tests";

/// Case names matching this pattern hold deliberately-crashing tests.
const DEATH_TEST_PATTERN: &str = "DeathTest";

/// A test case discovered inside one binary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseInventory {
    pub name: String,
    pub isolation: Isolation,
    pub tests: Vec<String>,
}

/// The full test inventory of one binary
#[derive(Clone, Debug)]
pub struct TestInventory {
    pub binary: PathBuf,
    pub cases: Vec<CaseInventory>,
}

impl TestInventory {
    pub fn test_count(&self) -> usize {
        self.cases.iter().map(|c| c.tests.len()).sum()
    }
}

/// Finds test binaries and lists the tests they contain
pub struct Discoverer {
    death_pattern: Regex,
}

impl Discoverer {
    pub fn new() -> Self {
        Self {
            death_pattern: Regex::new(DEATH_TEST_PATTERN).expect("death test pattern is valid"),
        }
    }

    /// List the executables in `dir` matching the test binary naming
    /// convention, sorted by file name.
    pub fn find_test_binaries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut binaries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_test_binary(&path) {
                binaries.push(path);
            }
        }
        binaries.sort();
        debug!(
            "Found {} test binaries in {}",
            binaries.len(),
            dir.display()
        );
        Ok(binaries)
    }

    /// Run `binary --gtest_list_tests` and parse the inventory it prints.
    ///
    /// A binary that cannot be launched, exits non-zero, or prints an
    /// unparsable listing fails the whole run; there are no partial
    /// results.
    pub async fn list_tests(&self, binary: &Path) -> Result<TestInventory> {
        let output = Command::new(binary)
            .arg("--gtest_list_tests")
            .output()
            .await
            .map_err(|e| Error::Launch {
                binary: binary.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(Error::Listing {
                binary: binary.to_path_buf(),
                reason: format!(
                    "listing exited with status {}",
                    output.status.code().unwrap_or(-1)
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        self.parse_listing(binary, &text)
    }

    /// Parse the gtest listing format: an unindented line opens a test
    /// case, an indented line adds a test to the open case. The first
    /// whitespace-delimited token names the entry; the trailing `.` gtest
    /// prints after case names is stripped.
    fn parse_listing(&self, binary: &Path, text: &str) -> Result<TestInventory> {
        let mut cases: Vec<CaseInventory> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with(' ') {
                let name = first_token(line).trim_end_matches('.').to_string();
                let isolation = if self.death_pattern.is_match(&name) {
                    Isolation::Exclusive
                } else {
                    Isolation::Parallel
                };
                cases.push(CaseInventory {
                    name,
                    isolation,
                    tests: Vec::new(),
                });
            } else {
                let test = first_token(line).to_string();
                let case = cases.last_mut().ok_or_else(|| Error::Listing {
                    binary: binary.to_path_buf(),
                    reason: format!("test '{test}' listed before any test case"),
                })?;
                case.tests.push(test);
            }
        }

        Ok(TestInventory {
            binary: binary.to_path_buf(),
            cases,
        })
    }
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new()
    }
}

fn first_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or("")
}

fn is_test_binary(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = name.strip_suffix(".exe").unwrap_or(name);
    stem.ends_with(TEST_BINARY_SUFFIX)
}
