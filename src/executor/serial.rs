//! Serial execution of exclusive units
//!
//! Death tests run one at a time in sequence-index order with stdio left
//! attached to this process, so crash diagnostics land directly on the
//! console.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::WorkUnit;

/// Runs exclusive units sequentially, failing fast
pub struct SerialExecutor {
    report_dir: PathBuf,
}

impl SerialExecutor {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Run every unit to completion, in order. The first non-zero exit
    /// aborts the run with that unit's code; later units never start.
    pub async fn run(&self, units: &[WorkUnit]) -> Result<()> {
        println!("Running {} death test units...", units.len());

        for unit in units {
            info!("Running {unit}");
            let status = Command::new(&unit.binary)
                .args(unit.command_args(&self.report_dir))
                .status()
                .await
                .map_err(|e| Error::Launch {
                    binary: unit.binary.clone(),
                    source: e,
                })?;

            let code = status.code().unwrap_or(-1);
            if code != 0 {
                return Err(Error::DeathTestFailed {
                    code,
                    index: unit.index,
                    binary: unit.binary.clone(),
                    filter: unit.filter.clone(),
                });
            }
        }

        Ok(())
    }
}
