//! Term filter for exact term matching.

use std::any::Any;

use log::debug;

use crate::error::Result;
use crate::query::filter::Filter;
use crate::query::iterator::{DocIterator, EmptyIterator, PostingIterator};
use crate::query::prepared::{ExecutionContext, PrepareContext, PreparedEmpty, PreparedQuery};
use crate::query::scorer::{Boost, NO_BOOST, ScorerContext, TermStats, validate_boost};

/// A filter that matches documents containing a specific term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFilter {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
    /// The boost factor for this filter.
    boost: Boost,
}

impl TermFilter {
    /// Create a new term filter.
    ///
    /// The term is matched exactly and is not analyzed; pass it in the form
    /// the index stores (e.g., lowercased).
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermFilter {
            field: field.into(),
            term: term.into(),
            boost: NO_BOOST,
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }
}

impl Filter for TermFilter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        validate_boost(self.boost)?;

        let stats = TermStats {
            doc_freq: ctx.index.term_doc_freq(&self.field, &self.term),
            docs_count: ctx.index.docs_count(),
        };
        if stats.doc_freq == 0 {
            debug!("term {} matches no live document", self.description());
            return Ok(PreparedEmpty::boxed());
        }

        Ok(Box::new(PreparedTerm::new(
            self.field.clone(),
            self.term.clone(),
            stats,
            self.boost * ctx.boost,
        )))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn description(&self) -> String {
        if self.boost == NO_BOOST {
            format!("{}:{}", self.field, self.term)
        } else {
            format!("{}:{}^{}", self.field, self.term, self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Prepared term: index-wide statistics plus the effective boost.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTerm {
    field: String,
    term: String,
    stats: TermStats,
    boost: Boost,
}

impl PreparedTerm {
    pub fn new(field: String, term: String, stats: TermStats, boost: Boost) -> Self {
        PreparedTerm {
            field,
            term,
            stats,
            boost,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn stats(&self) -> TermStats {
        self.stats
    }
}

impl PreparedQuery for PreparedTerm {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        let Some(postings) = ctx.segment.postings(&self.field, &self.term) else {
            return Ok(EmptyIterator::boxed());
        };
        let scorers = ctx.order.prepare_scorers(
            &ScorerContext::new(self.boost)
                .with_segment(ctx.segment)
                .with_stats(self.stats),
        );
        Ok(Box::new(
            PostingIterator::new(postings).with_scorers(ctx.order, scorers),
        ))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::{MemoryIndex, MemorySegment};
    use crate::query::config::QueryConfig;
    use crate::query::iterator::collect_docs;
    use crate::query::prepared::is_empty_query;
    use crate::query::score::{Order, PreparedOrder};
    use crate::query::scorer::{FrequencySort, read_f32};

    fn index() -> MemoryIndex {
        let mut first = MemorySegment::builder();
        first.add_document([("body", "rust search rust")]);
        first.add_document([("body", "search engine")]);
        let mut second = MemorySegment::builder();
        second.add_document([("body", "rust")]);
        MemoryIndex::new(vec![first.build().unwrap(), second.build().unwrap()])
    }

    #[test]
    fn test_term_filter_creation() {
        let filter = TermFilter::new("body", "rust").with_boost(2.5);

        assert_eq!(filter.field(), "body");
        assert_eq!(filter.term(), "rust");
        assert_eq!(filter.boost(), 2.5);
        assert_eq!(filter.description(), "body:rust^2.5");
        assert_eq!(TermFilter::new("body", "rust").description(), "body:rust");
    }

    #[test]
    fn test_term_prepare_collects_stats() {
        let index = index();
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let ctx = PrepareContext::new(&index, &order, &config).with_boost(2.0);

        let prepared = TermFilter::new("body", "rust")
            .with_boost(3.0)
            .prepare(&ctx)
            .unwrap();
        let term = prepared.as_any().downcast_ref::<PreparedTerm>().unwrap();

        assert_eq!(term.boost(), 6.0);
        assert_eq!(
            term.stats(),
            TermStats {
                doc_freq: 2,
                docs_count: 3
            }
        );
    }

    #[test]
    fn test_missing_term_prepares_empty() {
        let index = index();
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let ctx = PrepareContext::new(&index, &order, &config);

        let prepared = TermFilter::new("body", "java").prepare(&ctx).unwrap();
        assert!(is_empty_query(prepared.as_ref()));
    }

    #[test]
    fn test_term_execute_per_segment() {
        let index = index();
        let order = Order::new().add(FrequencySort).prepare();
        let config = QueryConfig::default();
        let prepared = TermFilter::new("body", "rust")
            .prepare(&PrepareContext::new(&index, &order, &config))
            .unwrap();

        let mut first = MemorySegment::builder();
        first.add_document([("body", "rust search rust")]);
        first.add_document([("body", "search engine")]);
        let first = first.build().unwrap();

        let mut it = prepared
            .execute(&ExecutionContext::new(&first, &order, &config))
            .unwrap();
        let mut score = order.new_buffer();
        assert!(it.next());
        it.evaluate(&mut score);
        assert_eq!(read_f32(score.as_bytes()), 2.0);
        assert_eq!(collect_docs(it.as_mut()), Vec::<u32>::new());

        let mut empty = MemorySegment::builder();
        empty.add_document([("title", "rust")]);
        let empty = empty.build().unwrap();
        let it = prepared
            .execute(&ExecutionContext::new(&empty, &order, &config))
            .unwrap();
        assert!(it.is_exhausted());
    }

    #[test]
    fn test_term_rejects_negative_boost() {
        let index = index();
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let ctx = PrepareContext::new(&index, &order, &config);

        assert!(TermFilter::new("body", "rust")
            .with_boost(f32::NAN)
            .prepare(&ctx)
            .is_err());
    }
}
