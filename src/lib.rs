//! # Sarissa Query
//!
//! The boolean query layer of the Sarissa search library: document iterators,
//! their lazy costs and scores, and the filter trees that compile to them.
//!
//! ## Features
//!
//! - Pull-based document iterators with `next`/`seek` and a monotone contract
//! - Disjunction, min-match, conjunction and exclusion composites
//! - Lazily evaluated cost estimates used to order sub-iterators
//! - Pluggable sorts composed into fixed-size score buffers
//! - `And`/`Or`/`Not`/`MatchAll` filter trees with an optimising prepare step
//! - An in-memory segmented index for running filters end to end
//!
//! ## Example
//!
//! ```
//! use sarissa_query::prelude::*;
//!
//! let mut builder = MemorySegment::builder();
//! builder.add_document([("body", "rust search engine")]);
//! builder.add_document([("body", "rust compiler")]);
//! let index = MemoryIndex::new(vec![builder.build()?]);
//!
//! let filter = And::new()
//!     .add(Box::new(TermFilter::new("body", "rust")))
//!     .add(Box::new(Not::new(Box::new(TermFilter::new("body", "compiler")))));
//!
//! let searcher = Searcher::new(Box::new(index));
//! assert_eq!(searcher.count(&filter)?, 1);
//! # Ok::<(), sarissa_query::error::QueryError>(())
//! ```

pub mod cli;
pub mod error;
pub mod index;
pub mod query;
pub mod searcher;

pub mod prelude {
    pub use crate::error::{QueryError, Result};
    pub use crate::index::memory::{MemoryIndex, MemorySegment};
    pub use crate::index::reader::{IndexReader, SegmentReader};
    pub use crate::query::{
        And, BoostSort, DocIterator, Filter, FilterSpec, FrequencySort, MatchAll, Not, Or, Order,
        QueryConfig, SearchResults, TermFilter,
    };
    pub use crate::searcher::Searcher;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
