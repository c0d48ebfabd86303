//! Set difference of two document iterators.

use crate::query::attributes::{Attributes, Document};
use crate::query::cost::CostHandle;
use crate::query::iterator::{DocId, DocIterator, advance_past, doc_limits};
use crate::query::score::ScoreBuffer;

/// Documents of `included` that are absent from `excluded`.
///
/// Cost and score are those of `included`.
#[derive(Debug)]
pub struct Exclusion {
    included: Box<dyn DocIterator>,
    excluded: Box<dyn DocIterator>,
    doc: Document,
    cost: CostHandle,
}

impl Exclusion {
    pub fn new(included: Box<dyn DocIterator>, excluded: Box<dyn DocIterator>) -> Self {
        let cost = included.cost_handle();
        let mut doc = Document::new();
        if included.is_exhausted() {
            doc.value = doc_limits::EOF;
        }
        Exclusion {
            included,
            excluded,
            doc,
            cost,
        }
    }

    /// Skip candidates present in `excluded`.
    fn settle(&mut self, mut candidate: DocId) -> DocId {
        while !doc_limits::eof(candidate) && self.excluded.seek(candidate) == candidate {
            self.included.next();
            candidate = self.included.value();
        }
        self.doc.value = candidate;
        candidate
    }
}

impl DocIterator for Exclusion {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        let candidate = advance_past(self.included.as_mut(), current);
        !doc_limits::eof(self.settle(candidate))
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.doc.value {
            return self.doc.value;
        }
        let candidate = self.included.seek(target);
        self.settle(candidate)
    }

    fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.doc, &self.cost).with_score(self.included.attributes().score)
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        self.included.evaluate(dst);
    }
}
