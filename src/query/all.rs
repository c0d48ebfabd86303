//! Match-all filter and the iterator over a segment's live documents.

use std::any::Any;
use std::sync::Arc;

use bit_vec::BitVec;

use crate::error::Result;
use crate::index::reader::SegmentReader;
use crate::query::attributes::{Attributes, Document, Frequency};
use crate::query::cost::{Cost, CostHandle};
use crate::query::filter::Filter;
use crate::query::iterator::{DocId, DocIterator, doc_limits};
use crate::query::prepared::{ExecutionContext, PrepareContext, PreparedQuery};
use crate::query::score::{PreparedOrder, Score, ScoreBuffer, Scorers};
use crate::query::scorer::{Boost, NO_BOOST, ScorerContext, validate_boost};

/// Iterates every live document of a segment.
#[derive(Debug)]
pub struct AllIterator {
    live_docs: Arc<BitVec>,
    max_doc: DocId,
    doc: Document,
    freq: Frequency,
    cost: CostHandle,
    score: Option<Score>,
    scorers: Scorers,
}

impl AllIterator {
    /// Iterate the set bits of `live_docs` up to `max_doc`.
    ///
    /// The cost is the live document count, computed on first read.
    pub fn new(live_docs: Arc<BitVec>, max_doc: DocId) -> Self {
        let counted = Arc::clone(&live_docs);
        AllIterator {
            live_docs,
            max_doc: max_doc.min(doc_limits::EOF - 1),
            doc: Document::new(),
            freq: Frequency { value: 1 },
            cost: Cost::lazy(move || counted.iter().filter(|&live| live).count() as u64),
            score: None,
            scorers: Scorers::empty(),
        }
    }

    pub fn from_segment(segment: &dyn SegmentReader) -> Self {
        Self::new(segment.live_docs(), segment.max_doc())
    }

    /// Attach per-bucket scorers prepared from `order`.
    pub fn with_scorers(mut self, order: &PreparedOrder, scorers: Scorers) -> Self {
        self.score = if scorers.is_empty() {
            None
        } else {
            order.score_attribute()
        };
        self.scorers = scorers;
        self
    }

    /// Position on the first live document `>= from`.
    fn scan(&mut self, from: DocId) -> DocId {
        let mut doc = from.max(doc_limits::MIN);
        while doc <= self.max_doc {
            if self.live_docs.get(doc as usize).unwrap_or(false) {
                self.doc.value = doc;
                return doc;
            }
            doc += 1;
        }
        self.doc.value = doc_limits::EOF;
        doc_limits::EOF
    }
}

impl DocIterator for AllIterator {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        if doc_limits::eof(self.doc.value) {
            return false;
        }
        !doc_limits::eof(self.scan(self.doc.value + 1))
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.doc.value {
            return self.doc.value;
        }
        self.scan(target)
    }

    fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.doc, &self.cost)
            .with_score(self.score.as_ref())
            .with_frequency(&self.freq)
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        if self.score.is_some() {
            self.scorers.evaluate(self.doc.value, self.freq.value, dst);
        }
    }
}

/// Filter matching every live document.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAll {
    boost: Boost,
}

impl MatchAll {
    pub fn new() -> Self {
        MatchAll { boost: NO_BOOST }
    }

    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }
}

impl Default for MatchAll {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for MatchAll {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        validate_boost(self.boost)?;
        Ok(Box::new(PreparedAll::new(self.boost * ctx.boost)))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn description(&self) -> String {
        if self.boost == NO_BOOST {
            "*:*".to_string()
        } else {
            format!("*:*^{}", self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Prepared form of [`MatchAll`], scored with its effective boost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedAll {
    boost: Boost,
}

impl PreparedAll {
    pub fn new(boost: Boost) -> Self {
        PreparedAll { boost }
    }
}

impl PreparedQuery for PreparedAll {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Box<dyn DocIterator>> {
        let scorers = ctx
            .order
            .prepare_scorers(&ScorerContext::new(self.boost).with_segment(ctx.segment));
        Ok(Box::new(
            AllIterator::from_segment(ctx.segment).with_scorers(ctx.order, scorers),
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
    use crate::query::score::Order;
    use crate::query::scorer::{BoostSort, read_f32};

    fn live(bits: &[bool]) -> Arc<BitVec> {
        let mut live = BitVec::from_elem(bits.len(), false);
        for (doc, &bit) in bits.iter().enumerate() {
            live.set(doc, bit);
        }
        Arc::new(live)
    }

    #[test]
    fn test_all_iterator_skips_deleted() {
        let mut it = AllIterator::new(live(&[false, true, false, true, true, false]), 5);

        assert_eq!(it.value(), doc_limits::INVALID);
        assert_eq!(it.cost(), 3);
        assert_eq!(collect_docs(&mut it), vec![1, 3, 4]);
        assert!(!it.next());
    }

    #[test]
    fn test_all_iterator_seek() {
        let mut it = AllIterator::new(live(&[false, true, true, false, true]), 4);

        assert_eq!(it.seek(3), 4);
        assert_eq!(it.seek(2), 4);
        assert_eq!(it.seek(5), doc_limits::EOF);
    }

    #[test]
    fn test_all_iterator_cost_is_lazy() {
        let it = AllIterator::new(live(&[false, true]), 1);
        assert!(!it.attributes().cost.is_evaluated());
        assert_eq!(it.cost(), 1);
    }

    #[test]
    fn test_match_all_prepare_and_score() {
        let mut builder = MemorySegment::builder();
        builder.add_postings("f", "a", &[2]);
        let mut segment = builder.build().unwrap();
        segment.delete(1).unwrap();
        let index = MemoryIndex::new(Vec::new());

        let order = Order::new().add(BoostSort).prepare();
        let config = QueryConfig::default();
        let ctx = PrepareContext::new(&index, &order, &config).with_boost(2.0);
        let prepared = MatchAll::new().with_boost(3.0).prepare(&ctx).unwrap();
        assert_eq!(prepared.boost(), 6.0);

        let mut it = prepared
            .execute(&ExecutionContext::new(&segment, &order, &config))
            .unwrap();
        let mut score = order.new_buffer();
        assert!(it.next());
        assert_eq!(it.value(), 2);
        it.evaluate(&mut score);
        assert_eq!(read_f32(score.as_bytes()), 6.0);
        assert!(!it.next());
    }

    #[test]
    fn test_match_all_rejects_bad_boost() {
        let index = MemoryIndex::new(Vec::new());
        let order = PreparedOrder::unordered();
        let config = QueryConfig::default();
        let ctx = PrepareContext::new(&index, &order, &config);

        assert!(MatchAll::new().with_boost(-1.0).prepare(&ctx).is_err());
        assert_eq!(MatchAll::new().description(), "*:*");
    }
}
