//! Collector implementations for gathering search results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::query::SearchHit;
use crate::query::iterator::DocId;
use crate::query::score::{PreparedOrder, ScoreBuffer};

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Collect a matching document and its score under the prepared order.
    fn collect(&mut self, segment: usize, doc_id: DocId, score: &ScoreBuffer) -> Result<()>;

    /// Get the final results, best first.
    fn results(&self) -> Vec<SearchHit>;

    /// Get the total number of hits collected.
    fn total_hits(&self) -> u64;

    /// Whether the caller must evaluate scores before collecting.
    fn needs_scores(&self) -> bool {
        true
    }

    /// Reset the collector for a new search.
    fn reset(&mut self);
}

/// A scored document for use in the heap.
///
/// Ordered so that the worst ranked hit is the greatest: lower score first,
/// then later `(segment, doc_id)`.
#[derive(Debug, Clone)]
struct ScoredDoc {
    order: Arc<PreparedOrder>,
    segment: usize,
    doc_id: DocId,
    score: ScoreBuffer,
}

impl ScoredDoc {
    fn to_hit(&self) -> SearchHit {
        SearchHit {
            segment: self.segment,
            doc_id: self.doc_id,
            scores: self.order.values(&self.score),
        }
    }
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.order.less(&self.score, &other.score) {
            Ordering::Greater
        } else if self.order.less(&other.score, &self.score) {
            Ordering::Less
        } else {
            (self.segment, self.doc_id).cmp(&(other.segment, other.doc_id))
        }
    }
}

/// A collector that keeps the top N documents under a prepared order.
///
/// Ties keep the document seen first, i.e. the smaller `(segment, doc_id)`.
#[derive(Debug)]
pub struct TopDocsCollector {
    /// Maximum number of documents to collect.
    max_docs: usize,
    order: Arc<PreparedOrder>,
    /// Collected hits, worst on top.
    hits: BinaryHeap<ScoredDoc>,
    /// Total number of documents processed.
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize, order: Arc<PreparedOrder>) -> Self {
        TopDocsCollector {
            max_docs,
            order,
            hits: BinaryHeap::with_capacity(max_docs.min(1024)),
            total_hits: 0,
        }
    }

    /// Get the maximum number of documents to collect.
    pub fn max_docs(&self) -> usize {
        self.max_docs
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, segment: usize, doc_id: DocId, score: &ScoreBuffer) -> Result<()> {
        self.total_hits += 1;
        if self.max_docs == 0 {
            return Ok(());
        }

        let scored_doc = ScoredDoc {
            order: Arc::clone(&self.order),
            segment,
            doc_id,
            score: score.clone(),
        };

        if self.hits.len() < self.max_docs {
            self.hits.push(scored_doc);
        } else if let Some(worst) = self.hits.peek() {
            if scored_doc < *worst {
                self.hits.pop();
                self.hits.push(scored_doc);
            }
        }

        Ok(())
    }

    fn results(&self) -> Vec<SearchHit> {
        let mut ranked: Vec<&ScoredDoc> = self.hits.iter().collect();
        ranked.sort();
        ranked.into_iter().map(ScoredDoc::to_hit).collect()
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn needs_scores(&self) -> bool {
        !self.order.is_empty()
    }

    fn reset(&mut self) {
        self.hits.clear();
        self.total_hits = 0;
    }
}

/// A collector that just counts the number of matching documents.
#[derive(Debug, Default)]
pub struct CountCollector {
    /// Total number of documents that matched.
    count: u64,
}

impl CountCollector {
    /// Create a new count collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    fn collect(&mut self, _segment: usize, _doc_id: DocId, _score: &ScoreBuffer) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn results(&self) -> Vec<SearchHit> {
        // Count collector doesn't return actual documents
        Vec::new()
    }

    fn total_hits(&self) -> u64 {
        self.count
    }

    fn needs_scores(&self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}
