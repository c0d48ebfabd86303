//! Boolean query algebra: document iterators, their composition and the
//! filter trees that compile to them.

pub mod all;
pub mod attributes;
pub mod boolean;
pub mod collector;
pub mod config;
pub mod conjunction;
pub mod cost;
pub mod disjunction;
pub mod exclusion;
pub mod filter;
pub mod iterator;
pub mod min_match;
pub mod prepared;
pub mod score;
pub mod scorer;
pub mod term;

use serde::{Deserialize, Serialize};

use crate::query::iterator::DocId;

pub use self::all::{AllIterator, MatchAll, PreparedAll};
pub use self::attributes::{Attributes, Document, Frequency};
pub use self::boolean::{And, Not, Or};
pub use self::collector::{Collector, CountCollector, TopDocsCollector};
pub use self::config::QueryConfig;
pub use self::conjunction::{Conjunction, make_conjunction};
pub use self::cost::{Cost, CostHandle};
pub use self::disjunction::{BasicDisjunction, Disjunction, SmallDisjunction, make_disjunction};
pub use self::exclusion::Exclusion;
pub use self::filter::{EmptyFilter, Filter, FilterSpec};
pub use self::iterator::{DocIterator, EmptyIterator, PostingIterator, doc_limits};
pub use self::min_match::{MinMatchDisjunction, make_min_match};
pub use self::prepared::{
    ExecutionContext, PrepareContext, PreparedConjunction, PreparedDisjunction, PreparedEmpty,
    PreparedNot, PreparedQuery,
};
pub use self::score::{NO_SCORE, Order, PreparedOrder, Score, ScoreBuffer};
pub use self::scorer::{Boost, BoostSort, FrequencySort, NO_BOOST, Scorer, Sort, TermStats};
pub use self::term::{PreparedTerm, TermFilter};

/// A matching document and its score, one value per sort of the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Ordinal of the segment holding the document.
    pub segment: usize,
    /// The document ID within its segment.
    pub doc_id: DocId,
    /// Score values in sort order; empty for unordered searches.
    pub scores: Vec<f64>,
}

/// Search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The search hits, best first.
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents.
    pub total_hits: u64,
}
