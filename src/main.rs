//! partest - Parallel test runner for GoogleTest-style test suites
//!
//! Discovers `*_tests` binaries in the given directories, partitions
//! their tests into schedulable units at a configurable granularity,
//! then runs death test units one at a time before fanning the rest out
//! in parallel with tagged, multiplexed output.
//!
//! ## Usage
//!
//! ```bash
//! # Every individual test as its own unit (the default granularity)
//! partest path/to/bin
//!
//! # Whole binaries, with coverage instrumentation
//! partest --granularity:Package --instrument:true path/to/bin
//!
//! # Per-directory modifiers reset after each path
//! partest --granularity:TestCase fast_suite slow_suite
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing::{debug, error, info};

mod cli;
mod config;
mod discovery;
mod error;
mod executor;
mod instrument;
mod models;
mod output;
mod partition;
mod results;
mod utils;

use cli::{Args, DirectorySpec};
use config::RunConfig;
use discovery::Discoverer;
use error::Error;
use executor::{ParallelExecutor, SerialExecutor};
use instrument::Instrumentor;
use models::{Granularity, WorkUnit};
use partition::Partitioner;

#[tokio::main]
async fn main() {
    utils::init_logger();

    if let Err(err) = run().await {
        error!("{err:#}");
        let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
        process::exit(code);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let specs = cli::parse_directory_specs(&args.specs)?;
    let config = RunConfig::load();

    let units = discover_units(&specs).await?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            "Work units: {}",
            serde_json::to_string(&units).unwrap_or_default()
        );
    }

    Instrumentor::new(&config.instrument_tool)
        .instrument_units(&units)
        .await;

    let (exclusive, parallel): (Vec<WorkUnit>, Vec<WorkUnit>) =
        units.into_iter().partition(WorkUnit::is_exclusive);

    SerialExecutor::new(&config.report_dir).run(&exclusive).await?;
    ParallelExecutor::new(&config.report_dir).run(parallel).await?;

    Ok(())
}

/// Discover and partition every directory argument into work units, in
/// argument order. One partitioner hands out all sequence indices, so
/// they stay unique and contiguous across directories.
async fn discover_units(specs: &[DirectorySpec]) -> Result<Vec<WorkUnit>> {
    let discoverer = Discoverer::new();
    let mut partitioner = Partitioner::new();
    let mut units = Vec::new();

    for spec in specs {
        let binaries = discoverer
            .find_test_binaries(&spec.dir)
            .with_context(|| format!("scanning {}", spec.dir.display()))?;
        info!(
            "{}: {} test binaries at {} granularity",
            spec.dir.display(),
            binaries.len(),
            spec.granularity
        );

        for binary in binaries {
            match spec.granularity {
                Granularity::Package => {
                    units.extend(partitioner.package_units(&binary, spec.instrument));
                }
                granularity => {
                    let inventory = discoverer.list_tests(&binary).await?;
                    units.extend(partitioner.inventory_units(
                        &inventory,
                        granularity,
                        spec.instrument,
                    ));
                }
            }
        }
    }

    info!("Partitioned {} work units", units.len());
    Ok(units)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::Isolation;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod script");
        path
    }

    fn listing_binary(dir: &Path, name: &str) -> PathBuf {
        fake_binary(
            dir,
            name,
            "printf 'Alpha.\\n  X\\n  Y\\nBetaDeathTest.\\n  Z\\n'",
        )
    }

    #[tokio::test]
    async fn test_discover_units_at_test_granularity() {
        let dir = tempfile::tempdir().expect("tempdir");
        listing_binary(dir.path(), "foo_tests");

        let specs = vec![DirectorySpec {
            dir: dir.path().to_path_buf(),
            granularity: Granularity::Test,
            instrument: false,
        }];
        let units = discover_units(&specs).await.expect("discovery");

        let filters: Vec<_> = units.iter().map(|u| u.filter.as_str()).collect();
        assert_eq!(filters, vec!["Alpha.X", "Alpha.Y", "BetaDeathTest.Z"]);
        assert_eq!(units[0].isolation, Isolation::Parallel);
        assert_eq!(units[2].isolation, Isolation::Exclusive);
    }

    #[tokio::test]
    async fn test_indices_stay_contiguous_across_directories() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        listing_binary(first.path(), "foo_tests");
        listing_binary(second.path(), "bar_tests");

        let specs = vec![
            DirectorySpec {
                dir: first.path().to_path_buf(),
                granularity: Granularity::TestCase,
                instrument: false,
            },
            DirectorySpec {
                dir: second.path().to_path_buf(),
                granularity: Granularity::Package,
                instrument: false,
            },
        ];
        let units = discover_units(&specs).await.expect("discovery");

        let indices: Vec<_> = units.iter().map(|u| u.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_package_granularity_skips_the_listing_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A binary that cannot even list its tests partitions fine at
        // Package granularity.
        fake_binary(dir.path(), "opaque_tests", "exit 1");

        let specs = vec![DirectorySpec {
            dir: dir.path().to_path_buf(),
            granularity: Granularity::Package,
            instrument: false,
        }];
        let units = discover_units(&specs).await.expect("discovery");
        assert_eq!(units.len(), 2);
        assert!(units[1].is_exclusive());
    }

    #[tokio::test]
    async fn test_death_tests_complete_before_any_parallel_launch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("launch.log");
        let death = fake_binary(
            dir.path(),
            "death_tests",
            &format!(
                "echo death-start >> \"{log}\"; sleep 0.2; echo death-end >> \"{log}\"",
                log = log.display()
            ),
        );
        let fast = fake_binary(
            dir.path(),
            "fast_tests",
            &format!("echo parallel >> \"{}\"", log.display()),
        );

        let exclusive = vec![WorkUnit::new(&death, "*DeathTest.*", 0, Isolation::Exclusive)];
        let parallel = vec![
            WorkUnit::new(&fast, "Alpha.X", 1, Isolation::Parallel),
            WorkUnit::new(&fast, "Alpha.Y", 2, Isolation::Parallel),
        ];

        SerialExecutor::new(dir.path())
            .run(&exclusive)
            .await
            .expect("serial phase");
        ParallelExecutor::new(dir.path())
            .run(parallel)
            .await
            .expect("parallel phase");

        let entries = std::fs::read_to_string(&log).expect("read log");
        let lines: Vec<_> = entries.lines().collect();
        assert_eq!(&lines[..2], &["death-start", "death-end"]);
        assert_eq!(&lines[2..], &["parallel", "parallel"]);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_discovery() {
        let specs = vec![DirectorySpec {
            dir: PathBuf::from("/nonexistent/partest-dir"),
            granularity: Granularity::Test,
            instrument: false,
        }];
        let err = discover_units(&specs).await.expect_err("missing directory");
        assert!(err.to_string().contains("scanning"));
    }
}
