//! Schedulable unit models
//!
//! Defines scheduling granularity, isolation classes, and the immutable
//! WorkUnit consumed by the executors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Scheduling unit size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One pair of units per test binary, no discovery run.
    Package,
    /// One unit per discovered test case.
    TestCase,
    /// One unit per discovered individual test.
    #[default]
    Test,
}

impl Granularity {
    /// Parse a granularity name, ignoring case.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "package" => Some(Granularity::Package),
            "testcase" => Some(Granularity::TestCase),
            "test" => Some(Granularity::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Package => write!(f, "Package"),
            Granularity::TestCase => write!(f, "TestCase"),
            Granularity::Test => write!(f, "Test"),
        }
    }
}

/// How a unit may share the run with others.
///
/// Death tests deliberately crash their process and must never overlap
/// another running unit; everything else is free to run concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Runs concurrently with other parallel units.
    Parallel,
    /// Runs alone, to completion, before the parallel phase starts.
    Exclusive,
}

/// One schedulable execution of a test binary under a filter expression.
///
/// Units are immutable once created; the sequence index is unique across
/// a run and names the unit's report file and output tag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkUnit {
    pub binary: PathBuf,
    pub filter: String,
    pub index: usize,
    pub isolation: Isolation,
    pub instrument: bool,
}

impl WorkUnit {
    pub fn new(
        binary: impl Into<PathBuf>,
        filter: impl Into<String>,
        index: usize,
        isolation: Isolation,
    ) -> Self {
        Self {
            binary: binary.into(),
            filter: filter.into(),
            index,
            isolation,
            instrument: false,
        }
    }

    pub fn with_instrument(mut self, instrument: bool) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn is_exclusive(&self) -> bool {
        self.isolation == Isolation::Exclusive
    }

    /// Report file name derived from the sequence index.
    pub fn report_file_name(&self) -> String {
        format!("gtest_results_{}.xml", self.index)
    }

    /// Arguments passed to the test binary for this unit.
    pub fn command_args(&self, report_dir: &Path) -> Vec<String> {
        vec![
            format!("--gtest_filter={}", self.filter),
            format!(
                "--gtest_output=xml:{}",
                report_dir.join(self.report_file_name()).display()
            ),
        ]
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {} --gtest_filter={}",
            self.index,
            self.binary.display(),
            self.filter
        )
    }
}

/// Completion record for one executed unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub index: usize,
    pub binary: PathBuf,
    pub filter: String,
    pub exit_code: i32,
    /// Captured stdout, in source order. Empty for exclusive units, whose
    /// streams stay attached to the console.
    pub stdout_lines: Vec<String>,
    /// Captured stderr, in source order.
    pub stderr_lines: Vec<String>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_from_str() {
        assert_eq!(Granularity::from_str("Package"), Some(Granularity::Package));
        assert_eq!(
            Granularity::from_str("testcase"),
            Some(Granularity::TestCase)
        );
        assert_eq!(Granularity::from_str("TEST"), Some(Granularity::Test));
        assert_eq!(Granularity::from_str("suite"), None);
    }

    #[test]
    fn test_granularity_default() {
        assert_eq!(Granularity::default(), Granularity::Test);
    }

    #[test]
    fn test_report_file_name_uses_index() {
        let unit = WorkUnit::new("foo_tests", "*", 17, Isolation::Parallel);
        assert_eq!(unit.report_file_name(), "gtest_results_17.xml");
    }

    #[test]
    fn test_command_args() {
        let unit = WorkUnit::new("foo_tests", "Alpha.X", 2, Isolation::Parallel);
        let args = unit.command_args(Path::new("TestResults"));
        assert_eq!(
            args,
            vec![
                "--gtest_filter=Alpha.X".to_string(),
                "--gtest_output=xml:TestResults/gtest_results_2.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_display_names_index_binary_and_filter() {
        let unit = WorkUnit::new("bin/foo_tests", "Alpha.*", 4, Isolation::Exclusive);
        assert_eq!(
            unit.to_string(),
            "(4) bin/foo_tests --gtest_filter=Alpha.*"
        );
    }

    #[test]
    fn test_outcome_success() {
        let outcome = UnitOutcome {
            index: 0,
            binary: PathBuf::from("foo_tests"),
            filter: "*".to_string(),
            exit_code: 0,
            stdout_lines: Vec::new(),
            stderr_lines: Vec::new(),
        };
        assert!(outcome.is_success());
    }
}
