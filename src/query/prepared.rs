//! Prepared queries: immutable, index-bound compilations of a filter tree.
//!
//! A [`Filter`](crate::query::filter::Filter) is prepared once against an
//! index. The result is executed once per segment and yields the
//! [`DocIterator`] tree that actually walks documents.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::index::reader::{IndexReader, SegmentReader};
use crate::query::config::QueryConfig;
use crate::query::conjunction::make_conjunction;
use crate::query::disjunction::make_disjunction;
use crate::query::exclusion::Exclusion;
use crate::query::iterator::{DocIterator, EmptyIterator};
use crate::query::min_match::make_min_match;
use crate::query::score::PreparedOrder;
use crate::query::scorer::{Boost, NO_BOOST};

/// Inputs of [`Filter::prepare`](crate::query::filter::Filter::prepare).
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext<'a> {
    pub index: &'a dyn IndexReader,
    pub order: &'a Arc<PreparedOrder>,
    pub config: &'a QueryConfig,
    /// Boost inherited from the ancestors of the filter being prepared.
    pub boost: Boost,
}

impl<'a> PrepareContext<'a> {
    pub fn new(
        index: &'a dyn IndexReader,
        order: &'a Arc<PreparedOrder>,
        config: &'a QueryConfig,
    ) -> Self {
        PrepareContext {
            index,
            order,
            config,
            boost: NO_BOOST,
        }
    }

    /// The same context with a different inherited boost.
    pub fn with_boost(self, boost: Boost) -> Self {
        PrepareContext { boost, ..self }
    }
}

/// Inputs of [`PreparedQuery::execute`].
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub segment: &'a dyn SegmentReader,
    pub order: &'a Arc<PreparedOrder>,
    pub config: &'a QueryConfig,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        segment: &'a dyn SegmentReader,
        order: &'a Arc<PreparedOrder>,
        config: &'a QueryConfig,
    ) -> Self {
        ExecutionContext {
            segment,
            order,
            config,
        }
    }

    /// Execute `query` without scoring, as needed for pure filters.
    pub fn execute_unscored(&self, query: &dyn PreparedQuery) -> Result<Box<dyn DocIterator>> {
        let unordered = PreparedOrder::unordered();
        query.execute(&ExecutionContext {
            order: &unordered,
            ..*self
        })
    }
}

/// A filter compiled against an index.
pub trait PreparedQuery: Send + Sync + Debug {
    /// Build the iterator over `ctx.segment`.
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>>;

    /// Effective boost resolved at prepare time.
    fn boost(&self) -> Boost;

    fn as_any(&self) -> &dyn Any;
}

/// Whether `query` is the query that never matches.
pub fn is_empty_query(query: &dyn PreparedQuery) -> bool {
    query.as_any().is::<PreparedEmpty>()
}

/// Matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreparedEmpty;

impl PreparedEmpty {
    pub fn boxed() -> Box<dyn PreparedQuery> {
        Box::new(PreparedEmpty)
    }
}

impl PreparedQuery for PreparedEmpty {
    fn execute(&self, _ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        Ok(EmptyIterator::boxed())
    }

    fn boost(&self) -> Boost {
        NO_BOOST
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Intersection of `children` minus the union of `excluded`.
#[derive(Debug)]
pub struct PreparedConjunction {
    children: Vec<Box<dyn PreparedQuery>>,
    excluded: Vec<Box<dyn PreparedQuery>>,
    boost: Boost,
}

impl PreparedConjunction {
    pub fn new(
        children: Vec<Box<dyn PreparedQuery>>,
        excluded: Vec<Box<dyn PreparedQuery>>,
        boost: Boost,
    ) -> Self {
        PreparedConjunction {
            children,
            excluded,
            boost,
        }
    }

    pub fn children(&self) -> &[Box<dyn PreparedQuery>] {
        &self.children
    }

    pub fn excluded(&self) -> &[Box<dyn PreparedQuery>] {
        &self.excluded
    }
}

impl PreparedQuery for PreparedConjunction {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        let branches = self
            .children
            .iter()
            .map(|child| child.execute(ctx))
            .collect::<Result<Vec<_>>>()?;
        let included = make_conjunction(branches, ctx.order, ctx.config)?;
        exclude(included, &self.excluded, ctx)
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Documents matched by at least `min_match` of `children`.
#[derive(Debug)]
pub struct PreparedDisjunction {
    children: Vec<Box<dyn PreparedQuery>>,
    min_match: usize,
    boost: Boost,
}

impl PreparedDisjunction {
    pub fn new(children: Vec<Box<dyn PreparedQuery>>, min_match: usize, boost: Boost) -> Self {
        PreparedDisjunction {
            children,
            min_match,
            boost,
        }
    }

    pub fn children(&self) -> &[Box<dyn PreparedQuery>] {
        &self.children
    }

    pub fn min_match(&self) -> usize {
        self.min_match
    }
}

impl PreparedQuery for PreparedDisjunction {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        let branches = self
            .children
            .iter()
            .map(|child| child.execute(ctx))
            .collect::<Result<Vec<_>>>()?;
        make_min_match(branches, self.min_match, ctx.order, ctx.config)
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Documents of `universe` not matched by `excluded`.
#[derive(Debug)]
pub struct PreparedNot {
    universe: Box<dyn PreparedQuery>,
    excluded: Box<dyn PreparedQuery>,
}

impl PreparedNot {
    pub fn new(universe: Box<dyn PreparedQuery>, excluded: Box<dyn PreparedQuery>) -> Self {
        PreparedNot { universe, excluded }
    }

    pub fn excluded(&self) -> &dyn PreparedQuery {
        self.excluded.as_ref()
    }
}

impl PreparedQuery for PreparedNot {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        let universe = self.universe.execute(ctx)?;
        exclude(universe, std::slice::from_ref(&self.excluded), ctx)
    }

    fn boost(&self) -> Boost {
        self.universe.boost()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wrap `included` in an exclusion of the union of `excluded`, if any.
fn exclude(
    included: Box<dyn DocIterator>,
    excluded: &[Box<dyn PreparedQuery>],
    ctx: &ExecutionContext<'_>,
) -> Result<Box<dyn DocIterator>> {
    if excluded.is_empty() || included.is_exhausted() {
        return Ok(included);
    }
    let branches = excluded
        .iter()
        .map(|query| ctx.execute_unscored(query.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let excluded = make_disjunction(branches, &PreparedOrder::unordered(), ctx.config)?;
    if excluded.is_exhausted() {
        return Ok(included);
    }
    Ok(Box::new(Exclusion::new(included, excluded)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::{MemoryIndex, MemorySegment};
    use crate::query::all::PreparedAll;
    use crate::query::iterator::collect_docs;
    use crate::query::filter::Filter;
    use crate::query::term::TermFilter;

    fn segment() -> MemorySegment {
        let mut builder = MemorySegment::builder();
        builder
            .add_postings("f", "a", &[1, 2, 3, 4])
            .add_postings("f", "b", &[2, 4, 6])
            .add_postings("f", "c", &[4]);
        builder.build().unwrap()
    }

    fn term(index: &MemoryIndex, name: &str) -> Box<dyn PreparedQuery> {
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        TermFilter::new("f", name)
            .prepare(&PrepareContext::new(index, &order, &config))
            .unwrap()
    }

    #[test]
    fn test_prepared_empty() {
        let segment = segment();
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let ctx = ExecutionContext::new(&segment, &order, &config);

        assert!(is_empty_query(&PreparedEmpty));
        assert_eq!(PreparedEmpty.boost(), NO_BOOST);
        assert!(PreparedEmpty.execute(&ctx).unwrap().is_exhausted());
    }

    #[test]
    fn test_prepared_conjunction_with_exclusions() {
        let index = MemoryIndex::new(vec![segment()]);
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let query = PreparedConjunction::new(
            vec![term(&index, "a"), term(&index, "b")],
            vec![term(&index, "c")],
            NO_BOOST,
        );

        let segment = segment();
        let ctx = ExecutionContext::new(&segment, &order, &config);
        let mut it = query.execute(&ctx).unwrap();
        assert_eq!(collect_docs(it.as_mut()), vec![2]);
    }

    #[test]
    fn test_prepared_disjunction() {
        let index = MemoryIndex::new(vec![segment()]);
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let query = PreparedDisjunction::new(
            vec![term(&index, "a"), term(&index, "b"), term(&index, "c")],
            2,
            NO_BOOST,
        );

        let segment = segment();
        let ctx = ExecutionContext::new(&segment, &order, &config);
        let mut it = query.execute(&ctx).unwrap();
        assert_eq!(collect_docs(it.as_mut()), vec![2, 4]);
        assert_eq!(query.min_match(), 2);
    }

    #[test]
    fn test_prepared_not() {
        let index = MemoryIndex::new(vec![segment()]);
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let query = PreparedNot::new(Box::new(PreparedAll::new(2.0)), term(&index, "a"));

        let segment = segment();
        let ctx = ExecutionContext::new(&segment, &order, &config);
        let mut it = query.execute(&ctx).unwrap();
        assert_eq!(collect_docs(it.as_mut()), vec![5, 6]);
        assert_eq!(query.boost(), 2.0);
    }
}
