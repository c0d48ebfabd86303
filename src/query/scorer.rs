//! Scoring configuration: sorts, scorers and boosts.

use std::fmt::Debug;

use crate::error::{QueryError, Result};
use crate::index::reader::SegmentReader;
use crate::query::iterator::DocId;

/// Multiplicative relevance weight.
pub type Boost = f32;

/// The "no boost" value.
pub const NO_BOOST: Boost = 1.0;

/// Reject boosts that would poison score propagation.
pub fn validate_boost(boost: Boost) -> Result<()> {
    if boost.is_nan() || boost.is_infinite() || boost < 0.0 {
        return Err(QueryError::invalid_filter(format!(
            "boost must be a finite non-negative number, got {boost}"
        )));
    }
    Ok(())
}

/// Index-wide statistics of a single term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStats {
    /// Number of live documents containing the term.
    pub doc_freq: u64,
    /// Number of live documents in the index.
    pub docs_count: u64,
}

/// Everything a sort may consult when preparing a leaf scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScorerContext<'a> {
    /// Segment the leaf iterates, if any.
    pub segment: Option<&'a dyn SegmentReader>,
    /// Statistics of the leaf's term.
    pub stats: TermStats,
    /// Effective boost of the leaf.
    pub boost: Boost,
}

impl<'a> ScorerContext<'a> {
    pub fn new(boost: Boost) -> Self {
        ScorerContext {
            segment: None,
            stats: TermStats::default(),
            boost,
        }
    }

    pub fn with_segment(mut self, segment: &'a dyn SegmentReader) -> Self {
        self.segment = Some(segment);
        self
    }

    pub fn with_stats(mut self, stats: TermStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Writes one bucket of a leaf's score.
pub trait Scorer: Send + Debug {
    /// Write the score of `doc` (matched `freq` times) into `dst`.
    fn score(&mut self, doc: DocId, freq: u32, dst: &mut [u8]);
}

/// One sort of a scoring order.
pub trait Sort: Send + Sync + Debug {
    /// Get the name of this sort.
    fn name(&self) -> &'static str;

    /// Bytes occupied by this sort's bucket.
    fn score_size(&self) -> usize;

    /// Required alignment of the bucket offset.
    fn score_align(&self) -> usize {
        self.score_size().clamp(1, 16)
    }

    /// Create the scorer of a leaf iterator.
    fn prepare_scorer(&self, ctx: &ScorerContext<'_>) -> Box<dyn Scorer>;

    /// Accumulate `src` into `dst`.
    fn add(&self, dst: &mut [u8], src: &[u8]);

    /// Whether `lhs` ranks lower than `rhs`.
    fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool;

    /// Numeric view of a bucket, for reporting.
    fn as_f64(&self, score: &[u8]) -> f64;
}

pub fn read_f32(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    f32::from_ne_bytes(raw)
}

pub fn write_f32(bytes: &mut [u8], value: f32) {
    bytes[..4].copy_from_slice(&value.to_ne_bytes());
}

/// A scorer that always writes the same score.
#[derive(Debug, Clone)]
pub struct ConstantScorer {
    /// The constant score value.
    score: f32,
    /// The boost factor.
    boost: Boost,
}

impl ConstantScorer {
    /// Create a new constant scorer with boost.
    pub fn with_boost(score: f32, boost: Boost) -> Self {
        ConstantScorer { score, boost }
    }
}

impl Scorer for ConstantScorer {
    fn score(&mut self, _doc: DocId, _freq: u32, dst: &mut [u8]) {
        write_f32(dst, self.score * self.boost);
    }
}

/// Scores every matching leaf with its effective boost.
///
/// Composite scores are therefore the sum of the boost products of the leaf
/// paths that matched, which makes boost propagation directly observable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoostSort;

impl Sort for BoostSort {
    fn name(&self) -> &'static str {
        "boost"
    }

    fn score_size(&self) -> usize {
        std::mem::size_of::<f32>()
    }

    fn prepare_scorer(&self, ctx: &ScorerContext<'_>) -> Box<dyn Scorer> {
        Box::new(ConstantScorer::with_boost(1.0, ctx.boost))
    }

    fn add(&self, dst: &mut [u8], src: &[u8]) {
        write_f32(dst, read_f32(dst) + read_f32(src));
    }

    fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool {
        read_f32(lhs) < read_f32(rhs)
    }

    fn as_f64(&self, score: &[u8]) -> f64 {
        read_f32(score) as f64
    }
}

/// Scores term frequency times boost.
#[derive(Debug, Clone)]
pub struct FrequencyScorer {
    boost: Boost,
}

impl Scorer for FrequencyScorer {
    fn score(&mut self, _doc: DocId, freq: u32, dst: &mut [u8]) {
        write_f32(dst, freq as f32 * self.boost);
    }
}

/// Ranks by how often the query terms occur, weighted by boost.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencySort;

impl Sort for FrequencySort {
    fn name(&self) -> &'static str {
        "frequency"
    }

    fn score_size(&self) -> usize {
        std::mem::size_of::<f32>()
    }

    fn prepare_scorer(&self, ctx: &ScorerContext<'_>) -> Box<dyn Scorer> {
        Box::new(FrequencyScorer { boost: ctx.boost })
    }

    fn add(&self, dst: &mut [u8], src: &[u8]) {
        write_f32(dst, read_f32(dst) + read_f32(src));
    }

    fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool {
        read_f32(lhs) < read_f32(rhs)
    }

    fn as_f64(&self, score: &[u8]) -> f64 {
        read_f32(score) as f64
    }
}
