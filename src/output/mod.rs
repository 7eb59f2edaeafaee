//! Output multiplexing module
//!
//! Interleaves the captured streams of concurrently-running units,
//! tagging each line with its unit's sequence index.

mod multiplexer;

pub use multiplexer::{drain_stream, OutputMultiplexer, StreamKind, TaggedLine};
