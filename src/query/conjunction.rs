//! Intersection of document iterators.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::query::attributes::{Attributes, Document};
use crate::query::config::QueryConfig;
use crate::query::cost::{Cost, CostHandle};
use crate::query::iterator::{DocId, DocIterator, EmptyIterator, advance_past, doc_limits};
use crate::query::score::{PreparedOrder, Score, ScoreBuffer};

/// Matches documents present in every branch.
///
/// The first branch leads: it proposes candidates and every other branch is
/// sought to the candidate. A branch landing beyond the candidate becomes the
/// new candidate. Branches are ordered by ascending cost on the first move so
/// that the rarest branch leads, which keeps cost evaluation lazy until then.
#[derive(Debug)]
pub struct Conjunction {
    branches: Vec<Box<dyn DocIterator>>,
    sort_by_cost: bool,
    started: bool,
    doc: Document,
    cost: CostHandle,
    order: Arc<PreparedOrder>,
    score: Option<Score>,
    scratch: ScoreBuffer,
}

impl Conjunction {
    pub fn new(branches: Vec<Box<dyn DocIterator>>, order: Arc<PreparedOrder>) -> Result<Self> {
        for branch in &branches {
            order.check_branch(branch.attributes().score)?;
        }
        let cost = Cost::min(branches.iter().map(|branch| branch.cost_handle()).collect());
        let mut doc = Document::new();
        if branches.is_empty() || branches.iter().any(|branch| branch.is_exhausted()) {
            doc.value = doc_limits::EOF;
        }

        Ok(Conjunction {
            branches,
            sort_by_cost: true,
            started: false,
            doc,
            cost,
            score: order.score_attribute(),
            scratch: order.new_buffer(),
            order,
        })
    }

    /// Keep the branches in the given order instead of sorting them by cost.
    pub fn sort_by_cost(mut self, enabled: bool) -> Self {
        self.sort_by_cost = enabled;
        self
    }

    fn start(&mut self) {
        if !self.started {
            self.started = true;
            if self.sort_by_cost {
                self.branches.sort_by_cached_key(|branch| branch.cost());
            }
        }
    }

    /// Leapfrog from `candidate` until every branch agrees.
    fn converge(&mut self, mut candidate: DocId) -> DocId {
        'outer: loop {
            if doc_limits::eof(candidate) {
                break;
            }
            for i in 1..self.branches.len() {
                let doc = self.branches[i].seek(candidate);
                if doc > candidate {
                    candidate = self.branches[0].seek(doc);
                    continue 'outer;
                }
            }
            break;
        }
        self.doc.value = candidate;
        candidate
    }
}

impl DocIterator for Conjunction {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        self.start();
        let candidate = advance_past(self.branches[0].as_mut(), current);
        !doc_limits::eof(self.converge(candidate))
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.doc.value {
            return self.doc.value;
        }
        self.start();
        let candidate = self.branches[0].seek(target);
        self.converge(candidate)
    }

    fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.doc, &self.cost).with_score(self.score.as_ref())
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        if self.score.is_none() {
            return;
        }
        dst.clear();
        for branch in &mut self.branches {
            self.order
                .accumulate(branch.as_mut(), &mut self.scratch, dst);
        }
    }
}

/// Build the cheapest intersection of `branches`.
///
/// No branch yields an empty iterator and a single branch is returned as is.
pub fn make_conjunction(
    mut branches: Vec<Box<dyn DocIterator>>,
    order: &Arc<PreparedOrder>,
    config: &QueryConfig,
) -> Result<Box<dyn DocIterator>> {
    if branches.iter().any(|branch| branch.is_exhausted()) {
        debug!("conjunction has an exhausted branch and matches nothing");
        return Ok(EmptyIterator::boxed());
    }
    if branches.len() <= 1 {
        return Ok(branches.pop().unwrap_or_else(EmptyIterator::boxed));
    }
    let conjunction = Conjunction::new(branches, Arc::clone(order))?
        .sort_by_cost(config.sort_conjunction_by_cost);
    Ok(Box::new(conjunction))
}
