//! Disjunction requiring at least `K` branches to agree on a document.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::query::attributes::{Attributes, Document};
use crate::query::config::QueryConfig;
use crate::query::conjunction::make_conjunction;
use crate::query::cost::{Cost, CostHandle};
use crate::query::disjunction::make_disjunction;
use crate::query::iterator::{DocId, DocIterator, EmptyIterator, advance_past, doc_limits};
use crate::query::score::{PreparedOrder, Score, ScoreBuffer};

/// Matches documents present in at least `min_match` branches.
///
/// A `min_match` of zero behaves like one.
#[derive(Debug)]
pub struct MinMatchDisjunction {
    branches: Vec<Box<dyn DocIterator>>,
    min_match: usize,
    /// Reused buffer of live branch positions.
    positions: Vec<DocId>,
    doc: Document,
    cost: CostHandle,
    order: Arc<PreparedOrder>,
    score: Option<Score>,
    scratch: ScoreBuffer,
}

impl MinMatchDisjunction {
    pub fn new(
        branches: Vec<Box<dyn DocIterator>>,
        min_match: usize,
        order: Arc<PreparedOrder>,
    ) -> Result<Self> {
        for branch in &branches {
            order.check_branch(branch.attributes().score)?;
        }
        let min_match = min_match.max(1);
        let cost = Cost::min_match(
            branches.iter().map(|branch| branch.cost_handle()).collect(),
            min_match,
        );
        let mut doc = Document::new();
        if branches.len() < min_match {
            doc.value = doc_limits::EOF;
        }

        Ok(MinMatchDisjunction {
            positions: Vec::with_capacity(branches.len()),
            branches,
            min_match,
            doc,
            cost,
            score: order.score_attribute(),
            scratch: order.new_buffer(),
            order,
        })
    }

    pub fn min_match(&self) -> usize {
        self.min_match
    }

    /// Number of branches positioned on the current document.
    pub fn match_count(&self) -> usize {
        self.branches
            .iter()
            .filter(|branch| branch.value() == self.doc.value)
            .count()
    }

    /// Advance lagging branches until `min_match` of them agree on the
    /// smallest candidate, or too few branches remain.
    fn converge(&mut self) -> DocId {
        loop {
            self.branches.retain(|branch| !branch.is_exhausted());
            if self.branches.len() < self.min_match {
                self.doc.value = doc_limits::EOF;
                return doc_limits::EOF;
            }

            self.positions.clear();
            self.positions
                .extend(self.branches.iter().map(|branch| branch.value()));
            let (lower, &mut bound, _) = self.positions.select_nth_unstable(self.min_match - 1);
            let smallest = lower.iter().copied().min().unwrap_or(bound);

            if smallest == bound {
                self.doc.value = bound;
                return bound;
            }
            for branch in &mut self.branches {
                if branch.value() < bound {
                    branch.seek(bound);
                }
            }
        }
    }
}

impl DocIterator for MinMatchDisjunction {
    fn value(&self) -> DocId {
        self.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        for branch in &mut self.branches {
            advance_past(branch.as_mut(), current);
        }
        !doc_limits::eof(self.converge())
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.doc.value {
            return self.doc.value;
        }
        for branch in &mut self.branches {
            branch.seek(target);
        }
        self.converge()
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
            if branch.value() == self.doc.value {
                self.order
                    .accumulate(branch.as_mut(), &mut self.scratch, dst);
            }
        }
    }
}

/// Build the cheapest iterator matching at least `min_match` of `branches`.
///
/// Degenerate thresholds collapse to a plain union (`K <= 1`), an
/// intersection (`K == N`) or the empty iterator (`K > N`).
pub fn make_min_match(
    branches: Vec<Box<dyn DocIterator>>,
    min_match: usize,
    order: &Arc<PreparedOrder>,
    config: &QueryConfig,
) -> Result<Box<dyn DocIterator>> {
    let count = branches.len();
    if min_match <= 1 {
        return make_disjunction(branches, order, config);
    }
    if min_match > count {
        debug!("min-match of {min_match} over {count} branches matches nothing");
        return Ok(EmptyIterator::boxed());
    }
    if min_match == count {
        return make_conjunction(branches, order, config);
    }
    Ok(Box::new(MinMatchDisjunction::new(
        branches,
        min_match,
        Arc::clone(order),
    )?))
}
