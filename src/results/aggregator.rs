//! Completion aggregation
//!
//! Watches parallel units finish in completion order and fails fast on
//! the first non-zero exit status.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::UnitOutcome;

/// Observes unit completions in completion order
#[derive(Debug, Default)]
pub struct Aggregator {
    completed: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await every in-flight unit. Returns the outcomes in completion
    /// order, or the first failure observed. Siblings still running are
    /// neither awaited nor cancelled in that case.
    pub async fn await_outcomes(
        mut self,
        inflight: &mut FuturesUnordered<JoinHandle<Result<UnitOutcome>>>,
    ) -> Result<Vec<UnitOutcome>> {
        let mut outcomes = Vec::new();

        while let Some(joined) = inflight.next().await {
            let outcome = joined??;
            self.completed += 1;
            debug!(
                "({}) exited with {} ({} completed)",
                outcome.index, outcome.exit_code, self.completed
            );

            if !outcome.is_success() {
                return Err(Error::UnitFailed {
                    code: outcome.exit_code,
                    index: outcome.index,
                    binary: outcome.binary,
                    filter: outcome.filter,
                });
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn outcome(index: usize, exit_code: i32) -> UnitOutcome {
        UnitOutcome {
            index,
            binary: PathBuf::from(format!("unit_{index}_tests")),
            filter: "*".to_string(),
            exit_code,
            stdout_lines: Vec::new(),
            stderr_lines: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_all_zero_outcomes_collected() {
        let mut inflight = FuturesUnordered::new();
        for index in 0..3 {
            inflight.push(tokio::spawn(async move { Ok(outcome(index, 0)) }));
        }

        let outcomes = Aggregator::new()
            .await_outcomes(&mut inflight)
            .await
            .expect("all units pass");
        assert_eq!(outcomes.len(), 3);
    }

    #[tokio::test]
    async fn test_first_completion_failure_wins() {
        let mut inflight = FuturesUnordered::new();
        // The slow passing unit completes after the fast failing one.
        inflight.push(tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(outcome(0, 0))
        }));
        inflight.push(tokio::spawn(async { Ok(outcome(1, 9)) }));

        let err = Aggregator::new()
            .await_outcomes(&mut inflight)
            .await
            .expect_err("failure propagates");
        match err {
            Error::UnitFailed { code, index, .. } => {
                assert_eq!(code, 9);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
