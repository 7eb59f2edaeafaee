//! Data models for test scheduling
//!
//! This module contains the schedulable-unit types used throughout the
//! application.

mod work_unit;

pub use work_unit::{Granularity, Isolation, UnitOutcome, WorkUnit};
