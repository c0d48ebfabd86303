//! Lazily evaluated cost estimates.
//!
//! Every iterator exposes its cost as a rule rather than a number. The rule
//! runs at most once, on the first [`Cost::estimate`] call, and the result is
//! cached for the lifetime of the iterator. Composite iterators build their
//! rule from the cost handles of their branches, so assembling an iterator tree
//! never evaluates any branch cost.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// A deferred cost computation.
pub type CostRule = Box<dyn FnOnce() -> u64 + Send>;

/// Shared handle to a cost attribute.
pub type CostHandle = Arc<Cost>;

/// Memoized cardinality estimate of an iterator.
pub struct Cost {
    value: OnceLock<u64>,
    rule: Mutex<Option<CostRule>>,
}

impl Cost {
    /// Create a cost whose value is computed by `rule` on first read.
    pub fn lazy<F>(rule: F) -> CostHandle
    where
        F: FnOnce() -> u64 + Send + 'static,
    {
        Arc::new(Cost {
            value: OnceLock::new(),
            rule: Mutex::new(Some(Box::new(rule))),
        })
    }

    /// Create a cost with a known value.
    pub fn fixed(value: u64) -> CostHandle {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Arc::new(Cost {
            value: cell,
            rule: Mutex::new(None),
        })
    }

    /// Cost of the sum of all branches (union upper bound).
    pub fn sum(branches: Vec<CostHandle>) -> CostHandle {
        Cost::lazy(move || {
            branches
                .iter()
                .fold(0u64, |acc, cost| acc.saturating_add(cost.estimate()))
        })
    }

    /// Cost of the smallest branch (intersection upper bound).
    pub fn min(branches: Vec<CostHandle>) -> CostHandle {
        Cost::lazy(move || {
            branches
                .iter()
                .map(|cost| cost.estimate())
                .min()
                .unwrap_or(0)
        })
    }

    /// Cost of an "at least `min_match` of N" union.
    ///
    /// Sums the `N - K + 1` smallest branch costs, which is the branch sum for
    /// `K <= 1`, the branch minimum for `K == N` and zero for `K > N`.
    pub fn min_match(branches: Vec<CostHandle>, min_match: usize) -> CostHandle {
        Cost::lazy(move || {
            let min_match = min_match.max(1);
            if min_match > branches.len() {
                return 0;
            }
            let mut costs: Vec<u64> = branches.iter().map(|cost| cost.estimate()).collect();
            costs.sort_unstable();
            costs
                .iter()
                .take(branches.len() - min_match + 1)
                .fold(0u64, |acc, &cost| acc.saturating_add(cost))
        })
    }

    /// Read the estimate, evaluating the rule on first access.
    pub fn estimate(&self) -> u64 {
        *self
            .value
            .get_or_init(|| self.rule.lock().take().map_or(0, |rule| rule()))
    }

    /// Whether the estimate has already been computed.
    pub fn is_evaluated(&self) -> bool {
        self.value.get().is_some()
    }
}

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("Cost").field(value).finish(),
            None => f.write_str("Cost(<lazy>)"),
        }
    }
}
