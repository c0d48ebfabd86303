//! Score buffers and the prepared scoring order.
//!
//! The iterator algebra never looks inside a score. Leaves write their
//! contribution into a [`ScoreBuffer`] through per-bucket [`Scorer`]s and
//! composites combine branch buffers with [`PreparedOrder::merge`]. Each sort
//! of the order owns a fixed, aligned byte range ("bucket") of the buffer.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::query::iterator::{DocId, DocIterator};
use crate::query::scorer::{Scorer, ScorerContext, Sort};

/// Opaque fixed-size storage for one document's score across all buckets.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ScoreBuffer {
    bytes: Vec<u8>,
}

impl ScoreBuffer {
    /// Create a zeroed buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        ScoreBuffer {
            bytes: vec![0; size],
        }
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes (unordered configuration).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reset every byte to zero.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for ScoreBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScoreBuffer({} bytes)", self.bytes.len())
    }
}

/// Score attribute of an iterator: the size of the buffer it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    size: usize,
}

/// The "no scoring configured" score.
pub static NO_SCORE: Score = Score { size: 0 };

impl Score {
    pub const fn new(size: usize) -> Self {
        Score { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this is the no-op score.
    pub fn is_default(&self) -> bool {
        self.size == 0
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    sort: Arc<dyn Sort>,
    range: Range<usize>,
}

/// An ordered list of sorts, as requested by the caller.
#[derive(Debug, Clone, Default)]
pub struct Order {
    sorts: Vec<Arc<dyn Sort>>,
}

impl Order {
    /// Create an empty (unordered) order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort.
    pub fn add<S: Sort + 'static>(mut self, sort: S) -> Self {
        self.sorts.push(Arc::new(sort));
        self
    }

    /// Append an already shared sort.
    pub fn push(&mut self, sort: Arc<dyn Sort>) {
        self.sorts.push(sort);
    }

    pub fn len(&self) -> usize {
        self.sorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    /// Lay out the buckets and freeze the order for query execution.
    pub fn prepare(&self) -> Arc<PreparedOrder> {
        let mut buckets = Vec::with_capacity(self.sorts.len());
        let mut offset = 0;
        let mut score_align = 1;

        for sort in &self.sorts {
            let align = sort.score_align().max(1);
            offset = align_up(offset, align);
            let size = sort.score_size();
            buckets.push(Bucket {
                sort: Arc::clone(sort),
                range: offset..offset + size,
            });
            offset += size;
            score_align = score_align.max(align);
        }

        Arc::new(PreparedOrder {
            buckets,
            score_size: align_up(offset, score_align),
            score_align,
        })
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// Frozen scoring configuration shared read-only by a whole query.
#[derive(Debug)]
pub struct PreparedOrder {
    buckets: Vec<Bucket>,
    score_size: usize,
    score_align: usize,
}

impl Default for PreparedOrder {
    fn default() -> Self {
        PreparedOrder {
            buckets: Vec::new(),
            score_size: 0,
            score_align: 1,
        }
    }
}

impl PreparedOrder {
    /// The configuration used when no scoring is requested.
    pub fn unordered() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total buffer size in bytes, padded to `score_align`.
    pub fn score_size(&self) -> usize {
        self.score_size
    }

    pub fn score_align(&self) -> usize {
        self.score_align
    }

    /// Sort names in bucket order.
    pub fn sort_names(&self) -> Vec<&'static str> {
        self.buckets.iter().map(|bucket| bucket.sort.name()).collect()
    }

    /// A zeroed buffer sized for this order.
    pub fn new_buffer(&self) -> ScoreBuffer {
        ScoreBuffer::new(self.score_size)
    }

    /// The score attribute composites expose under this order, if any.
    pub fn score_attribute(&self) -> Option<Score> {
        if self.is_empty() {
            None
        } else {
            Some(Score::new(self.score_size))
        }
    }

    /// Reject a branch whose score disagrees with this order.
    ///
    /// Branches without a score are accepted and contribute nothing.
    pub fn check_branch(&self, score: Option<&Score>) -> Result<()> {
        match score {
            Some(score) if !score.is_default() && score.size() != self.score_size => {
                Err(QueryError::score_mismatch(self.score_size, score.size()))
            }
            _ => Ok(()),
        }
    }

    /// Accumulate `src` into `dst`, bucket by bucket.
    pub fn add(&self, dst: &mut ScoreBuffer, src: &ScoreBuffer) {
        for bucket in &self.buckets {
            let range = bucket.range.clone();
            bucket.sort.add(
                &mut dst.as_bytes_mut()[range.clone()],
                &src.as_bytes()[range],
            );
        }
    }

    /// Overwrite `dst` with the combination of every source buffer.
    pub fn merge(&self, dst: &mut ScoreBuffer, srcs: &[&ScoreBuffer]) {
        dst.clear();
        for src in srcs {
            self.add(dst, src);
        }
    }

    /// Evaluate `branch` at its current document and add it to `dst`.
    ///
    /// Unscored branches contribute nothing.
    pub fn accumulate(
        &self,
        branch: &mut dyn DocIterator,
        scratch: &mut ScoreBuffer,
        dst: &mut ScoreBuffer,
    ) {
        if branch.attributes().score.is_some_and(|score| !score.is_default()) {
            scratch.clear();
            branch.evaluate(scratch);
            self.add(dst, scratch);
        }
    }

    /// Lexicographic "ranks lower" comparison across buckets.
    pub fn less(&self, lhs: &ScoreBuffer, rhs: &ScoreBuffer) -> bool {
        for bucket in &self.buckets {
            let range = bucket.range.clone();
            let (a, b) = (&lhs.as_bytes()[range.clone()], &rhs.as_bytes()[range]);
            if bucket.sort.less(a, b) {
                return true;
            }
            if bucket.sort.less(b, a) {
                return false;
            }
        }
        false
    }

    /// Numeric view of every bucket, for reporting.
    pub fn values(&self, score: &ScoreBuffer) -> Vec<f64> {
        self.buckets
            .iter()
            .map(|bucket| bucket.sort.as_f64(&score.as_bytes()[bucket.range.clone()]))
            .collect()
    }

    /// Instantiate one scorer per bucket for a leaf iterator.
    pub fn prepare_scorers(&self, ctx: &ScorerContext<'_>) -> Scorers {
        Scorers {
            entries: self
                .buckets
                .iter()
                .map(|bucket| (bucket.range.clone(), bucket.sort.prepare_scorer(ctx)))
                .collect(),
        }
    }
}

/// Per-bucket scorers owned by a leaf iterator.
#[derive(Debug, Default)]
pub struct Scorers {
    entries: Vec<(Range<usize>, Box<dyn Scorer>)>,
}

impl Scorers {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the leaf's contribution for `doc` into `dst`.
    pub fn evaluate(&mut self, doc: DocId, freq: u32, dst: &mut ScoreBuffer) {
        for (range, scorer) in &mut self.entries {
            scorer.score(doc, freq, &mut dst.as_bytes_mut()[range.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::scorer::{BoostSort, FrequencySort, read_f32};

    #[test]
    fn test_unordered() {
        let order = PreparedOrder::unordered();
        assert!(order.is_empty());
        assert_eq!(order.score_size(), 0);
        assert!(order.score_attribute().is_none());
        assert!(order.new_buffer().is_empty());
        assert!(NO_SCORE.is_default());
    }

    #[test]
    fn test_bucket_layout() {
        let order = Order::new().add(BoostSort).add(FrequencySort).prepare();
        assert_eq!(order.score_size(), 8);
        assert_eq!(order.score_align(), 4);
        assert_eq!(order.sort_names(), vec!["boost", "frequency"]);
        assert_eq!(order.score_attribute(), Some(Score::new(8)));
    }

    #[test]
    fn test_merge_and_less() {
        let order = Order::new().add(BoostSort).prepare();
        let mut a = order.new_buffer();
        let mut b = order.new_buffer();
        a.as_bytes_mut().copy_from_slice(&2.0f32.to_ne_bytes());
        b.as_bytes_mut().copy_from_slice(&3.5f32.to_ne_bytes());

        let mut dst = order.new_buffer();
        order.merge(&mut dst, &[&a, &b]);
        assert_eq!(read_f32(dst.as_bytes()), 5.5);
        assert_eq!(order.values(&dst), vec![5.5]);

        assert!(order.less(&a, &b));
        assert!(!order.less(&b, &a));
        assert!(!order.less(&a, &a));
    }

    #[test]
    fn test_check_branch() {
        let order = Order::new().add(BoostSort).prepare();
        assert!(order.check_branch(None).is_ok());
        assert!(order.check_branch(Some(&NO_SCORE)).is_ok());
        assert!(order.check_branch(Some(&Score::new(4))).is_ok());

        match order.check_branch(Some(&Score::new(12))) {
            Err(QueryError::ScoreMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 12);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
