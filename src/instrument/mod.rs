//! Coverage instrumentation pre-pass
//!
//! Wraps flagged binaries with the external coverage tool before any
//! unit executes. Invocations run concurrently with each other; the
//! whole batch is awaited before execution starts. Failures are
//! reported but do not abort the run.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::warn;

use crate::models::WorkUnit;
use crate::utils::Timer;

/// Thin adapter around the external instrumentation tool
pub struct Instrumentor {
    tool: PathBuf,
}

impl Instrumentor {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// Instrument every distinct binary among the flagged units, all
    /// concurrently, and wait for the whole batch. Returns the number of
    /// binaries attempted.
    pub async fn instrument_units(&self, units: &[WorkUnit]) -> usize {
        let mut binaries: Vec<&Path> = Vec::new();
        for unit in units.iter().filter(|u| u.instrument) {
            // A binary split into many units is instrumented once.
            if !binaries.contains(&unit.binary.as_path()) {
                binaries.push(unit.binary.as_path());
            }
        }
        if binaries.is_empty() {
            return 0;
        }

        println!("Instrumenting {} binaries...", binaries.len());
        let timer = Timer::start("instrumentation");
        join_all(
            binaries
                .iter()
                .map(|binary| self.instrument_binary(binary)),
        )
        .await;
        println!("Done ({} ms)", timer.elapsed_ms());

        binaries.len()
    }

    /// Run the tool against one binary, streaming the tool's stdout
    /// through to ours.
    async fn instrument_binary(&self, binary: &Path) {
        let spawned = Command::new(&self.tool)
            .arg("/coverage")
            .arg(binary)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    "Failed to launch {} for {}: {}",
                    self.tool.display(),
                    binary.display(),
                    e
                );
                return;
            }
        };

        if let Some(pipe) = child.stdout.take() {
            let mut lines = BufReader::new(pipe).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                println!("{line}");
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!(
                    "Instrumentation of {} exited with {}",
                    binary.display(),
                    status
                );
            }
            Err(e) => warn!("Instrumentation of {} failed: {}", binary.display(), e),
            Ok(_) => {}
        }
    }
}
