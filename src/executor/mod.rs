//! Two-phase test execution engine
//!
//! Exclusive (death test) units run strictly one at a time before the
//! parallel phase launches every remaining unit at once.

mod parallel;
mod serial;

pub use parallel::ParallelExecutor;
pub use serial::SerialExecutor;
