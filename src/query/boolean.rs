//! Boolean filters (`And`, `Or`, `Not`) and the rewrites applied while
//! preparing them.
//!
//! With [`QueryConfig::optimize`](crate::query::config::QueryConfig) set,
//! preparation collapses single-child nodes, eliminates double negation,
//! folds `MatchAll` children of an `And` into one boost and turns negated
//! children of an `And` into exclusions. Without it the tree is compiled
//! node for node, except that negated children of an `And` are still
//! excluded rather than scored. Matches and scores of exclusions are the
//! same either way, and malformed nodes are rejected wherever they sit.

use std::any::Any;

use log::debug;

use crate::error::{QueryError, Result};
use crate::query::all::{MatchAll, PreparedAll};
use crate::query::filter::Filter;
use crate::query::prepared::{
    PrepareContext, PreparedConjunction, PreparedDisjunction, PreparedEmpty, PreparedNot,
    PreparedQuery, is_empty_query,
};
use crate::query::scorer::{Boost, NO_BOOST, validate_boost};

fn describe(name: &str, children: &[Box<dyn Filter>]) -> String {
    let inner: Vec<String> = children.iter().map(|child| child.description()).collect();
    format!("{}({})", name, inner.join(", "))
}

fn with_boost_suffix(description: String, boost: Boost) -> String {
    if boost == NO_BOOST {
        description
    } else {
        format!("{description}^{boost}")
    }
}

fn prepare_all(
    children: &[Box<dyn Filter>],
    ctx: &PrepareContext<'_>,
) -> Result<Vec<Box<dyn PreparedQuery>>> {
    children.iter().map(|child| child.prepare(ctx)).collect()
}

/// Strip a chain of `Not`s off `filter`.
///
/// Returns the innermost filter, whether an odd number of negations was
/// stripped and the product of the stripped boosts.
fn strip_negations(filter: &dyn Filter) -> Result<(&dyn Filter, bool, Boost)> {
    let mut current = filter;
    let mut negated = false;
    let mut boost = NO_BOOST;
    while let Some(not) = current.as_any().downcast_ref::<Not>() {
        validate_boost(not.boost)?;
        current = not.child()?;
        negated = !negated;
        boost *= not.boost;
    }
    Ok((current, negated, boost))
}

/// Matches documents matched by every child.
#[derive(Debug, Clone)]
pub struct And {
    children: Vec<Box<dyn Filter>>,
    boost: Boost,
}

impl And {
    /// Create an empty conjunction. It matches nothing until children are added.
    pub fn new() -> Self {
        And {
            children: Vec::new(),
            boost: NO_BOOST,
        }
    }

    pub fn with_children(children: Vec<Box<dyn Filter>>) -> Self {
        And {
            children,
            boost: NO_BOOST,
        }
    }

    /// Add a child filter.
    pub fn add(mut self, child: Box<dyn Filter>) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Box<dyn Filter>) {
        self.children.push(child);
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }

    pub fn children(&self) -> &[Box<dyn Filter>] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn prepare_optimized(
        &self,
        ctx: &PrepareContext<'_>,
        boost: Boost,
    ) -> Result<Box<dyn PreparedQuery>> {
        let mut positives: Vec<(&dyn Filter, Boost)> = Vec::new();
        let mut negatives: Vec<&dyn Filter> = Vec::new();
        let mut all_boost = NO_BOOST;
        let mut has_all = false;
        let mut excludes_all = false;

        for child in &self.children {
            let (filter, negated, chain_boost) = strip_negations(child.as_ref())?;
            match (filter.as_any().downcast_ref::<MatchAll>(), negated) {
                (Some(all), true) => {
                    validate_boost(all.boost())?;
                    excludes_all = true;
                }
                (Some(all), false) => {
                    validate_boost(all.boost())?;
                    all_boost *= all.boost() * chain_boost;
                    has_all = true;
                }
                (None, true) => negatives.push(filter),
                (None, false) => positives.push((filter, chain_boost)),
            }
        }
        if excludes_all {
            // Nothing below is prepared, but a malformed sibling still fails
            for (filter, _) in &positives {
                filter.validate()?;
            }
            for filter in &negatives {
                filter.validate()?;
            }
            debug!("conjunction excludes every document, prepared as empty");
            return Ok(PreparedEmpty::boxed());
        }
        if has_all {
            debug!("folded match-all children of {} into boost {all_boost}", self.description());
        }

        let mut children = Vec::with_capacity(positives.len().max(1));
        if positives.is_empty() {
            children.push(Box::new(PreparedAll::new(boost * all_boost)) as Box<dyn PreparedQuery>);
        }
        let mut matches_nothing = false;
        for (filter, chain_boost) in positives {
            let prepared = filter.prepare(&ctx.with_boost(boost * all_boost * chain_boost))?;
            if is_empty_query(prepared.as_ref()) {
                debug!("conjunction child {} matches nothing", filter.description());
                matches_nothing = true;
            }
            children.push(prepared);
        }

        let mut excluded = Vec::with_capacity(negatives.len());
        for filter in negatives {
            let prepared = filter.prepare(&ctx.with_boost(NO_BOOST))?;
            if !is_empty_query(prepared.as_ref()) {
                excluded.push(prepared);
            }
        }
        if matches_nothing {
            return Ok(PreparedEmpty::boxed());
        }

        if excluded.is_empty() && children.len() == 1 {
            if let Some(only) = children.pop() {
                debug!("collapsed single-child conjunction {}", self.description());
                return Ok(only);
            }
        }
        Ok(Box::new(PreparedConjunction::new(children, excluded, boost)))
    }
}

impl Default for And {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for And {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        validate_boost(self.boost)?;
        if self.children.is_empty() {
            debug!("empty conjunction prepared as empty");
            return Ok(PreparedEmpty::boxed());
        }

        let boost = self.boost * ctx.boost;
        if ctx.config.optimize {
            return self.prepare_optimized(ctx, boost);
        }

        // Negated children are excluded rather than scored even without rewrites
        let mut children = Vec::with_capacity(self.children.len());
        let mut excluded = Vec::new();
        for child in &self.children {
            match child.as_any().downcast_ref::<Not>() {
                Some(not) => {
                    validate_boost(not.boost)?;
                    excluded.push(not.child()?.prepare(&ctx.with_boost(NO_BOOST))?);
                }
                None => children.push(child.prepare(&ctx.with_boost(boost))?),
            }
        }
        if children.is_empty() {
            children.push(Box::new(PreparedAll::new(boost)) as Box<dyn PreparedQuery>);
        }
        Ok(Box::new(PreparedConjunction::new(children, excluded, boost)))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn validate(&self) -> Result<()> {
        validate_boost(self.boost)?;
        self.children.iter().try_for_each(|child| child.validate())
    }

    fn description(&self) -> String {
        with_boost_suffix(describe("AND", &self.children), self.boost)
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents matched by at least `min_match` children (one by default).
#[derive(Debug, Clone)]
pub struct Or {
    children: Vec<Box<dyn Filter>>,
    min_match: usize,
    boost: Boost,
}

impl Or {
    /// Create an empty disjunction. It matches nothing until children are added.
    pub fn new() -> Self {
        Or {
            children: Vec::new(),
            min_match: 1,
            boost: NO_BOOST,
        }
    }

    pub fn with_children(children: Vec<Box<dyn Filter>>) -> Self {
        Or {
            children,
            ..Self::new()
        }
    }

    /// Add a child filter.
    pub fn add(mut self, child: Box<dyn Filter>) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Box<dyn Filter>) {
        self.children.push(child);
    }

    /// Require at least `min_match` children to match. Zero behaves like one.
    pub fn with_min_match(mut self, min_match: usize) -> Self {
        self.min_match = min_match;
        self
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }

    pub fn children(&self) -> &[Box<dyn Filter>] {
        &self.children
    }

    pub fn min_match(&self) -> usize {
        self.min_match
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for Or {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Or {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        validate_boost(self.boost)?;
        if self.children.is_empty() {
            debug!("empty disjunction prepared as empty");
            return Ok(PreparedEmpty::boxed());
        }

        let boost = self.boost * ctx.boost;
        let mut children = prepare_all(&self.children, &ctx.with_boost(boost))?;
        if !ctx.config.optimize {
            return Ok(Box::new(PreparedDisjunction::new(
                children,
                self.min_match,
                boost,
            )));
        }

        children.retain(|child| !is_empty_query(child.as_ref()));
        let min_match = self.min_match.max(1);
        if min_match > children.len() {
            debug!(
                "disjunction {} needs {min_match} of {} matchable children, prepared as empty",
                self.description(),
                children.len()
            );
            return Ok(PreparedEmpty::boxed());
        }
        if children.len() == 1 {
            if let Some(only) = children.pop() {
                debug!("collapsed single-child disjunction {}", self.description());
                return Ok(only);
            }
        }
        Ok(Box::new(PreparedDisjunction::new(children, min_match, boost)))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn validate(&self) -> Result<()> {
        validate_boost(self.boost)?;
        self.children.iter().try_for_each(|child| child.validate())
    }

    fn description(&self) -> String {
        let mut description = describe("OR", &self.children);
        if self.min_match > 1 {
            description = format!("{description}~{}", self.min_match);
        }
        with_boost_suffix(description, self.boost)
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches live documents not matched by its child.
///
/// Under an `And` the child becomes an exclusion of the other children.
/// Standing alone it excludes the child from every live document and scores
/// like [`MatchAll`] with its own effective boost.
#[derive(Debug, Clone)]
pub struct Not {
    child: Option<Box<dyn Filter>>,
    boost: Boost,
}

impl Not {
    pub fn new(child: Box<dyn Filter>) -> Self {
        Not {
            child: Some(child),
            boost: NO_BOOST,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }

    /// The negated filter; a `Not` without one is malformed.
    pub fn child(&self) -> Result<&dyn Filter> {
        self.child
            .as_deref()
            .ok_or_else(|| QueryError::invalid_filter("NOT filter requires exactly one child"))
    }
}

impl Default for Not {
    /// A `Not` without a child; preparing it fails.
    fn default() -> Self {
        Not {
            child: None,
            boost: NO_BOOST,
        }
    }
}

impl Filter for Not {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        validate_boost(self.boost)?;
        let child = self.child()?;
        let boost = self.boost * ctx.boost;

        if ctx.config.optimize {
            if let Some(inner) = child.as_any().downcast_ref::<Not>() {
                validate_boost(inner.boost)?;
                let grandchild = inner.child()?;
                debug!("eliminated double negation of {}", grandchild.description());
                return grandchild.prepare(&ctx.with_boost(boost * inner.boost));
            }
            if child.as_any().is::<MatchAll>() {
                child.validate()?;
                debug!("negated match-all prepared as empty");
                return Ok(PreparedEmpty::boxed());
            }
        }

        let excluded = child.prepare(&ctx.with_boost(NO_BOOST))?;
        let universe: Box<dyn PreparedQuery> = Box::new(PreparedAll::new(boost));
        if ctx.config.optimize && is_empty_query(excluded.as_ref()) {
            return Ok(universe);
        }
        Ok(Box::new(PreparedNot::new(universe, excluded)))
    }

    fn boost(&self) -> Boost {
        self.boost
    }

    fn validate(&self) -> Result<()> {
        validate_boost(self.boost)?;
        self.child()?.validate()
    }

    fn description(&self) -> String {
        let inner = self
            .child
            .as_ref()
            .map(|child| child.description())
            .unwrap_or_default();
        with_boost_suffix(format!("NOT({inner})"), self.boost)
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
