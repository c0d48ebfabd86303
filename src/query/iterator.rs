//! The document iterator protocol and leaf iterators.
//!
//! Every leaf and composite implements [`DocIterator`]: a forward-only cursor
//! over strictly ascending document ids. A fresh iterator sits on
//! [`doc_limits::INVALID`]; an exhausted one sits on [`doc_limits::EOF`] for
//! good.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::index::reader::Postings;
use crate::query::attributes::{Attributes, Document, Frequency};
use crate::query::cost::{Cost, CostHandle};
use crate::query::score::{PreparedOrder, Score, ScoreBuffer, Scorers};

/// Document identifier within a segment.
pub type DocId = u32;

/// Reserved document ids.
pub mod doc_limits {
    use super::DocId;

    /// Position of an iterator that has not been advanced yet.
    pub const INVALID: DocId = 0;

    /// Position of an exhausted iterator.
    pub const EOF: DocId = DocId::MAX;

    /// Smallest real document id.
    pub const MIN: DocId = 1;

    /// Whether `doc` is a real document id.
    pub const fn valid(doc: DocId) -> bool {
        INVALID < doc && doc < EOF
    }

    pub const fn eof(doc: DocId) -> bool {
        doc == EOF
    }
}

/// Forward-only cursor over a sorted, duplicate-free set of documents.
pub trait DocIterator: Send + Debug {
    /// Current document, `INVALID` before the first move, `EOF` once exhausted.
    fn value(&self) -> DocId;

    /// Move to the next document. Returns `false` once exhausted.
    fn next(&mut self) -> bool;

    /// Move to the first document `>= target` and return it.
    ///
    /// A target at or behind the current position leaves the iterator where
    /// it is.
    fn seek(&mut self, target: DocId) -> DocId;

    /// Attributes of this iterator.
    fn attributes(&self) -> Attributes<'_>;

    /// Write the score of the current document into `dst`.
    ///
    /// Unscored iterators leave `dst` untouched.
    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        let _ = dst;
    }

    /// Estimated number of documents, evaluated lazily.
    fn cost(&self) -> u64 {
        self.attributes().cost.estimate()
    }

    /// Shared handle to the cost attribute.
    fn cost_handle(&self) -> CostHandle {
        Arc::clone(self.attributes().cost)
    }

    /// Whether this iterator has reached `EOF`.
    fn is_exhausted(&self) -> bool {
        doc_limits::eof(self.value())
    }

    /// Restart iteration from the beginning.
    fn reset(&mut self) -> Result<()> {
        Err(QueryError::not_supported(
            "document iterators are forward-only and cannot be rewound",
        ))
    }
}

/// Move `it` strictly past `doc` (which must not be `EOF`) and return its position.
pub(crate) fn advance_past(it: &mut dyn DocIterator, doc: DocId) -> DocId {
    let value = it.value();
    if value == doc {
        it.next();
        it.value()
    } else if value < doc {
        it.seek(doc + 1)
    } else {
        value
    }
}

/// Drain an iterator into a vector of document ids.
pub fn collect_docs(it: &mut dyn DocIterator) -> Vec<DocId> {
    let mut docs = Vec::new();
    while it.next() {
        docs.push(it.value());
    }
    docs
}

/// An iterator that matches no documents.
#[derive(Debug)]
pub struct EmptyIterator {
    doc: Document,
    cost: CostHandle,
}

impl EmptyIterator {
    pub fn new() -> Self {
        EmptyIterator {
            doc: Document::eof(),
            cost: Cost::fixed(0),
        }
    }

    /// Boxed empty iterator.
    pub fn boxed() -> Box<dyn DocIterator> {
        Box::new(Self::new())
    }
}

impl Default for EmptyIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocIterator for EmptyIterator {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        false
    }

    fn seek(&mut self, _target: DocId) -> DocId {
        self.doc.value
    }

    fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.doc, &self.cost)
    }
}

/// Iterator over a materialised posting list.
#[derive(Debug)]
pub struct PostingIterator {
    postings: Arc<Postings>,
    /// Index of the next unread entry.
    next_pos: usize,
    doc: Document,
    freq: Frequency,
    cost: CostHandle,
    score: Option<Score>,
    scorers: Scorers,
}

impl PostingIterator {
    /// Create an unscored iterator whose cost is the posting list length.
    pub fn new(postings: Arc<Postings>) -> Self {
        let cost = Cost::fixed(postings.len() as u64);
        PostingIterator {
            postings,
            next_pos: 0,
            doc: Document::new(),
            freq: Frequency::default(),
            cost,
            score: None,
            scorers: Scorers::empty(),
        }
    }

    /// Create an iterator over `docs` (each occurring once).
    pub fn from_docs(docs: &[DocId]) -> Result<Self> {
        Ok(Self::new(Arc::new(Postings::from_docs(docs)?)))
    }

    /// Replace the cost attribute.
    pub fn with_cost(mut self, cost: CostHandle) -> Self {
        self.cost = cost;
        self
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

    fn position(&mut self, pos: usize) -> DocId {
        match self.postings.docs().get(pos) {
            Some(&doc) => {
                self.doc.value = doc;
                self.freq.value = self.postings.freqs()[pos];
                self.next_pos = pos + 1;
            }
            None => {
                self.doc.value = doc_limits::EOF;
                self.freq.value = 0;
                self.next_pos = self.postings.len();
            }
        }
        self.doc.value
    }
}

impl DocIterator for PostingIterator {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        if doc_limits::eof(self.doc.value) {
            return false;
        }
        !doc_limits::eof(self.position(self.next_pos))
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.doc.value {
            return self.doc.value;
        }
        let remaining = &self.postings.docs()[self.next_pos..];
        let offset = remaining.partition_point(|&doc| doc < target);
        self.position(self.next_pos + offset)
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
