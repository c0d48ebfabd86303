//! Disjunction iterators: a document matches when any branch matches.
//!
//! Three strategies share one contract. [`BasicDisjunction`] handles exactly
//! two branches, [`SmallDisjunction`] scans a short branch list linearly and
//! [`Disjunction`] keeps the branches in a min-heap keyed by position.
//! [`make_disjunction`] picks one.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::query::attributes::{Attributes, Document};
use crate::query::config::QueryConfig;
use crate::query::cost::{Cost, CostHandle};
use crate::query::iterator::{DocId, DocIterator, EmptyIterator, advance_past, doc_limits};
use crate::query::score::{PreparedOrder, Score, ScoreBuffer};

/// State shared by every disjunction strategy.
#[derive(Debug)]
struct UnionState {
    doc: Document,
    cost: CostHandle,
    order: Arc<PreparedOrder>,
    score: Option<Score>,
    scratch: ScoreBuffer,
}

impl UnionState {
    fn new(branches: &[Box<dyn DocIterator>], order: Arc<PreparedOrder>) -> Result<Self> {
        for branch in branches {
            order.check_branch(branch.attributes().score)?;
        }
        let cost = Cost::sum(branches.iter().map(|branch| branch.cost_handle()).collect());
        Ok(UnionState {
            doc: Document::new(),
            cost,
            score: order.score_attribute(),
            scratch: order.new_buffer(),
            order,
        })
    }

    fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.doc, &self.cost).with_score(self.score.as_ref())
    }
}

/// Union of exactly two iterators.
#[derive(Debug)]
pub struct BasicDisjunction {
    lhs: Box<dyn DocIterator>,
    rhs: Box<dyn DocIterator>,
    state: UnionState,
}

impl BasicDisjunction {
    pub fn new(
        lhs: Box<dyn DocIterator>,
        rhs: Box<dyn DocIterator>,
        order: Arc<PreparedOrder>,
    ) -> Result<Self> {
        let branches = [lhs, rhs];
        let state = UnionState::new(&branches, order)?;
        let [lhs, rhs] = branches;
        Ok(BasicDisjunction { lhs, rhs, state })
    }

    fn settle(&mut self) -> DocId {
        self.state.doc.value = self.lhs.value().min(self.rhs.value());
        self.state.doc.value
    }
}

impl DocIterator for BasicDisjunction {
    fn value(&self) -> DocId {
        self.state.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.state.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        advance_past(self.lhs.as_mut(), current);
        advance_past(self.rhs.as_mut(), current);
        !doc_limits::eof(self.settle())
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.state.doc.value {
            return self.state.doc.value;
        }
        self.lhs.seek(target);
        self.rhs.seek(target);
        self.settle()
    }

    fn attributes(&self) -> Attributes<'_> {
        self.state.attributes()
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        let state = &mut self.state;
        if state.score.is_none() {
            return;
        }
        dst.clear();
        for branch in [&mut self.lhs, &mut self.rhs] {
            if branch.value() == state.doc.value {
                state
                    .order
                    .accumulate(branch.as_mut(), &mut state.scratch, dst);
            }
        }
    }
}

/// Union that rescans every live branch on each move.
///
/// Exhausted branches are dropped as soon as they hit `EOF`.
#[derive(Debug)]
pub struct SmallDisjunction {
    branches: Vec<Box<dyn DocIterator>>,
    state: UnionState,
}

impl SmallDisjunction {
    pub fn new(branches: Vec<Box<dyn DocIterator>>, order: Arc<PreparedOrder>) -> Result<Self> {
        let state = UnionState::new(&branches, order)?;
        let mut disjunction = SmallDisjunction { branches, state };
        if disjunction.branches.is_empty() {
            disjunction.state.doc.value = doc_limits::EOF;
        }
        Ok(disjunction)
    }

    fn settle(&mut self) -> DocId {
        self.branches.retain(|branch| !branch.is_exhausted());
        self.state.doc.value = self
            .branches
            .iter()
            .map(|branch| branch.value())
            .min()
            .unwrap_or(doc_limits::EOF);
        self.state.doc.value
    }
}

impl DocIterator for SmallDisjunction {
    fn value(&self) -> DocId {
        self.state.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.state.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        for branch in &mut self.branches {
            advance_past(branch.as_mut(), current);
        }
        !doc_limits::eof(self.settle())
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.state.doc.value {
            return self.state.doc.value;
        }
        for branch in &mut self.branches {
            branch.seek(target);
        }
        self.settle()
    }

    fn attributes(&self) -> Attributes<'_> {
        self.state.attributes()
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        let state = &mut self.state;
        if state.score.is_none() {
            return;
        }
        dst.clear();
        for branch in &mut self.branches {
            if branch.value() == state.doc.value {
                state
                    .order
                    .accumulate(branch.as_mut(), &mut state.scratch, dst);
            }
        }
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest document first.
#[derive(Debug, PartialEq, Eq)]
struct HeapEntry {
    doc: DocId,
    branch: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .doc
            .cmp(&self.doc)
            .then_with(|| other.branch.cmp(&self.branch))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Union over many branches driven by a min-heap of branch positions.
#[derive(Debug)]
pub struct Disjunction {
    branches: Vec<Box<dyn DocIterator>>,
    heap: BinaryHeap<HeapEntry>,
    /// Branches positioned on the current document, outside the heap.
    matched: Vec<usize>,
    state: UnionState,
}

impl Disjunction {
    pub fn new(branches: Vec<Box<dyn DocIterator>>, order: Arc<PreparedOrder>) -> Result<Self> {
        let state = UnionState::new(&branches, order)?;
        let mut disjunction = Disjunction {
            heap: BinaryHeap::with_capacity(branches.len()),
            matched: (0..branches.len()).collect(),
            branches,
            state,
        };
        if disjunction.branches.is_empty() {
            disjunction.state.doc.value = doc_limits::EOF;
        }
        Ok(disjunction)
    }

    /// Pop every branch sitting on the smallest document into `matched`.
    fn settle(&mut self) -> DocId {
        let Some(doc) = self.heap.peek().map(|entry| entry.doc) else {
            self.state.doc.value = doc_limits::EOF;
            return doc_limits::EOF;
        };
        while self.heap.peek().is_some_and(|entry| entry.doc == doc) {
            if let Some(entry) = self.heap.pop() {
                self.matched.push(entry.branch);
            }
        }
        self.state.doc.value = doc;
        doc
    }
}

impl DocIterator for Disjunction {
    fn value(&self) -> DocId {
        self.state.doc.value
    }

    fn next(&mut self) -> bool {
        let current = self.state.doc.value;
        if doc_limits::eof(current) {
            return false;
        }
        for branch in self.matched.drain(..) {
            let doc = advance_past(self.branches[branch].as_mut(), current);
            if !doc_limits::eof(doc) {
                self.heap.push(HeapEntry { doc, branch });
            }
        }
        !doc_limits::eof(self.settle())
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target <= self.state.doc.value {
            return self.state.doc.value;
        }
        for branch in self.matched.drain(..) {
            let doc = self.branches[branch].seek(target);
            if !doc_limits::eof(doc) {
                self.heap.push(HeapEntry { doc, branch });
            }
        }
        while self.heap.peek().is_some_and(|entry| entry.doc < target) {
            if let Some(HeapEntry { branch, .. }) = self.heap.pop() {
                let doc = self.branches[branch].seek(target);
                if !doc_limits::eof(doc) {
                    self.heap.push(HeapEntry { doc, branch });
                }
            }
        }
        self.settle()
    }

    fn attributes(&self) -> Attributes<'_> {
        self.state.attributes()
    }

    fn evaluate(&mut self, dst: &mut ScoreBuffer) {
        let state = &mut self.state;
        if state.score.is_none() {
            return;
        }
        dst.clear();
        for &branch in &self.matched {
            state
                .order
                .accumulate(self.branches[branch].as_mut(), &mut state.scratch, dst);
        }
    }
}

/// Build the cheapest union of `branches`.
///
/// Branches already at `EOF` are pruned; no branch yields an empty iterator
/// and a single branch is returned as is.
pub fn make_disjunction(
    branches: Vec<Box<dyn DocIterator>>,
    order: &Arc<PreparedOrder>,
    config: &QueryConfig,
) -> Result<Box<dyn DocIterator>> {
    let mut branches: Vec<_> = branches
        .into_iter()
        .filter(|branch| !branch.is_exhausted())
        .collect();

    match branches.len() {
        0 | 1 => Ok(branches.pop().unwrap_or_else(EmptyIterator::boxed)),
        2 => {
            let mut pair = branches.into_iter();
            match (pair.next(), pair.next()) {
                (Some(lhs), Some(rhs)) => Ok(Box::new(BasicDisjunction::new(
                    lhs,
                    rhs,
                    Arc::clone(order),
                )?)),
                _ => Ok(EmptyIterator::boxed()),
            }
        }
        n if n <= config.small_disjunction_threshold => {
            debug!("disjunction over {n} branches uses a linear scan");
            Ok(Box::new(SmallDisjunction::new(branches, Arc::clone(order))?))
        }
        n => {
            debug!("disjunction over {n} branches uses a heap");
            Ok(Box::new(Disjunction::new(branches, Arc::clone(order))?))
        }
    }
}
