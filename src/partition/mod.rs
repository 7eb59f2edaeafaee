//! Work unit partitioning
//!
//! Converts discovered inventory into schedulable WorkUnits at the
//! requested granularity. The partitioner owns the run-wide sequence
//! counter; indices are unique and contiguous across an invocation and
//! are never reused.

use std::path::Path;
use tracing::debug;

use crate::discovery::TestInventory;
use crate::models::{Granularity, Isolation, WorkUnit};

/// Filter selecting every death test in a binary.
pub const DEATH_TEST_FILTER: &str = "*DeathTest.*";

/// Filter selecting everything except death tests.
pub const NON_DEATH_TEST_FILTER: &str = "-*DeathTest.*";

/// Builds WorkUnits and hands out sequence indices
#[derive(Debug, Default)]
pub struct Partitioner {
    next_index: usize,
}

impl Partitioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units handed out so far.
    pub fn unit_count(&self) -> usize {
        self.next_index
    }

    fn next_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Package granularity: one parallel unit covering everything except
    /// death tests, then one exclusive unit covering only the death
    /// tests. No discovery run is needed.
    pub fn package_units(&mut self, binary: &Path, instrument: bool) -> Vec<WorkUnit> {
        vec![
            WorkUnit::new(
                binary,
                NON_DEATH_TEST_FILTER,
                self.next_index(),
                Isolation::Parallel,
            )
            .with_instrument(instrument),
            WorkUnit::new(
                binary,
                DEATH_TEST_FILTER,
                self.next_index(),
                Isolation::Exclusive,
            )
            .with_instrument(instrument),
        ]
    }

    /// TestCase or Test granularity over a discovered inventory, in
    /// discovery order.
    pub fn inventory_units(
        &mut self,
        inventory: &TestInventory,
        granularity: Granularity,
        instrument: bool,
    ) -> Vec<WorkUnit> {
        let mut units = Vec::new();
        match granularity {
            Granularity::Package => {
                units.extend(self.package_units(&inventory.binary, instrument));
            }
            Granularity::TestCase => {
                for case in &inventory.cases {
                    units.push(
                        WorkUnit::new(
                            &inventory.binary,
                            format!("{}.*", case.name),
                            self.next_index(),
                            case.isolation,
                        )
                        .with_instrument(instrument),
                    );
                }
            }
            Granularity::Test => {
                for case in &inventory.cases {
                    for test in &case.tests {
                        units.push(
                            WorkUnit::new(
                                &inventory.binary,
                                format!("{}.{}", case.name, test),
                                self.next_index(),
                                case.isolation,
                            )
                            .with_instrument(instrument),
                        );
                    }
                }
            }
        }
        debug!(
            "Partitioned {} into {} units",
            inventory.binary.display(),
            units.len()
        );
        units
    }
}
