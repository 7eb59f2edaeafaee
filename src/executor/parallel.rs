//! Parallel execution of safe units
//!
//! Every unit launches at once with no concurrency cap; two drain tasks
//! per unit feed the output multiplexer while the aggregator watches
//! completions.

use futures::stream::FuturesUnordered;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{UnitOutcome, WorkUnit};
use crate::output::{self, OutputMultiplexer, StreamKind, TaggedLine};
use crate::results::Aggregator;
use crate::utils::Timer;

/// Launches safe units concurrently and aggregates their completions
pub struct ParallelExecutor {
    report_dir: PathBuf,
}

impl ParallelExecutor {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Launch every unit at once and watch completions. Returns the
    /// outcomes in completion order once all units exited zero; the first
    /// non-zero exit aborts immediately without waiting for the rest.
    pub async fn run(&self, units: Vec<WorkUnit>) -> Result<Vec<UnitOutcome>> {
        println!("Running {} parallel units...", units.len());
        let timer = Timer::start("parallel phase");

        let (mux, printer) = OutputMultiplexer::spawn();
        let mut inflight = FuturesUnordered::new();
        for unit in units {
            // Each task owns its unit and its sender; nothing is shared
            // across iterations.
            let tx = mux.sender();
            let report_dir = self.report_dir.clone();
            inflight.push(tokio::spawn(run_unit(unit, report_dir, tx)));
        }
        drop(mux);

        let outcomes = Aggregator::new().await_outcomes(&mut inflight).await?;

        // All senders are gone once the drain tasks finish; the printer
        // flushes its backlog and exits.
        let _ = printer.await;
        println!("Done ({} ms)", timer.elapsed_ms());
        Ok(outcomes)
    }
}

/// Run one unit: spawn the child with piped streams, drain both streams
/// through the multiplexer, and wait for exit.
async fn run_unit(
    unit: WorkUnit,
    report_dir: PathBuf,
    tx: UnboundedSender<TaggedLine>,
) -> Result<UnitOutcome> {
    debug!("Launching {unit}");
    let mut child = Command::new(&unit.binary)
        .args(unit.command_args(&report_dir))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Launch {
            binary: unit.binary.clone(),
            source: e,
        })?;

    let stdout_task = child.stdout.take().map(|pipe| {
        tokio::spawn(output::drain_stream(
            pipe,
            unit.index,
            StreamKind::Stdout,
            tx.clone(),
        ))
    });
    let stderr_task = child.stderr.take().map(|pipe| {
        tokio::spawn(output::drain_stream(
            pipe,
            unit.index,
            StreamKind::Stderr,
            tx,
        ))
    });

    let status = child.wait().await?;
    let stdout_lines = match stdout_task {
        Some(task) => task.await?,
        None => Vec::new(),
    };
    let stderr_lines = match stderr_task {
        Some(task) => task.await?,
        None => Vec::new(),
    };

    Ok(UnitOutcome {
        index: unit.index,
        binary: unit.binary,
        filter: unit.filter,
        exit_code: status.code().unwrap_or(-1),
        stdout_lines,
        stderr_lines,
    })
}
