//! Result aggregation module
//!
//! Fail-fast observation of unit completions.

mod aggregator;

pub use aggregator::Aggregator;
