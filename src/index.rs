//! Index boundary of the query algebra.
//!
//! Segment readers supply posting lists and the universe of live documents.
//! The in-memory implementation backs tests, benchmarks and the CLI.

pub mod memory;
pub mod reader;

// Re-export commonly used types
pub use memory::{MemoryIndex, MemorySegment, MemorySegmentBuilder};
pub use reader::{IndexReader, Postings, SegmentReader};
