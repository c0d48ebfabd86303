//! Filter trees and their serialisable description.

use std::any::Any;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::all::MatchAll;
use crate::query::boolean::{And, Not, Or};
use crate::query::prepared::{PrepareContext, PreparedEmpty, PreparedQuery};
use crate::query::scorer::{Boost, NO_BOOST, validate_boost};
use crate::query::term::TermFilter;

/// A node of a boolean filter tree.
pub trait Filter: Send + Sync + Debug {
    /// Compile this filter against `ctx.index`.
    ///
    /// `ctx.boost` is the product of the ancestors' boosts; the node's own
    /// boost multiplies it.
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>>;

    fn boost(&self) -> Boost;

    /// Check the whole subtree for malformed nodes without preparing it.
    ///
    /// Rewrites may skip preparing parts of a tree; they validate them here
    /// instead so that a malformed tree is rejected regardless of its shape.
    fn validate(&self) -> Result<()> {
        validate_boost(self.boost())
    }

    /// Human readable form of the filter.
    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn Filter>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Filter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Filter that matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFilter;

impl Filter for EmptyFilter {
    fn prepare(&self, _ctx: &PrepareContext<'_>) -> Result<Box<dyn PreparedQuery>> {
        Ok(PreparedEmpty::boxed())
    }

    fn boost(&self) -> Boost {
        NO_BOOST
    }

    fn description(&self) -> String {
        "<empty>".to_string()
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn default_boost() -> Boost {
    NO_BOOST
}

fn default_min_match() -> usize {
    1
}

/// JSON description of a filter tree.
///
/// ```json
/// {"type": "and", "children": [
///     {"type": "term", "field": "body", "term": "rust"},
///     {"type": "not", "child": {"type": "term", "field": "body", "term": "java"}}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    Term {
        field: String,
        term: String,
        #[serde(default = "default_boost")]
        boost: Boost,
    },
    And {
        #[serde(default)]
        children: Vec<FilterSpec>,
        #[serde(default = "default_boost")]
        boost: Boost,
    },
    Or {
        #[serde(default)]
        children: Vec<FilterSpec>,
        #[serde(default = "default_min_match")]
        min_match: usize,
        #[serde(default = "default_boost")]
        boost: Boost,
    },
    Not {
        #[serde(default)]
        child: Option<Box<FilterSpec>>,
        #[serde(default = "default_boost")]
        boost: Boost,
    },
    All {
        #[serde(default = "default_boost")]
        boost: Boost,
    },
    Empty,
}

impl FilterSpec {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Build the filter tree this description stands for.
    pub fn into_filter(self) -> Box<dyn Filter> {
        match self {
            FilterSpec::Term { field, term, boost } => {
                Box::new(TermFilter::new(field, term).with_boost(boost))
            }
            FilterSpec::And { children, boost } => Box::new(
                And::with_children(children.into_iter().map(FilterSpec::into_filter).collect())
                    .with_boost(boost),
            ),
            FilterSpec::Or {
                children,
                min_match,
                boost,
            } => Box::new(
                Or::with_children(children.into_iter().map(FilterSpec::into_filter).collect())
                    .with_min_match(min_match)
                    .with_boost(boost),
            ),
            FilterSpec::Not { child, boost } => {
                let not = match child {
                    Some(child) => Not::new(child.into_filter()),
                    None => Not::default(),
                };
                Box::new(not.with_boost(boost))
            }
            FilterSpec::All { boost } => Box::new(MatchAll::new().with_boost(boost)),
            FilterSpec::Empty => Box::new(EmptyFilter),
        }
    }
}

impl From<FilterSpec> for Box<dyn Filter> {
    fn from(spec: FilterSpec) -> Self {
        spec.into_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_spec_from_json() {
        let spec = FilterSpec::from_json_str(
            r#"{"type": "or", "min_match": 2, "boost": 2.0, "children": [
                {"type": "term", "field": "f", "term": "a"},
                {"type": "not", "child": {"type": "all"}},
                {"type": "empty"}
            ]}"#,
        )
        .unwrap();

        match &spec {
            FilterSpec::Or {
                children,
                min_match,
                boost,
            } => {
                assert_eq!(children.len(), 3);
                assert_eq!(*min_match, 2);
                assert_eq!(*boost, 2.0);
                assert_eq!(
                    children[0],
                    FilterSpec::Term {
                        field: "f".to_string(),
                        term: "a".to_string(),
                        boost: NO_BOOST,
                    }
                );
            }
            other => panic!("unexpected spec {other:?}"),
        }

        let filter = spec.into_filter();
        assert_eq!(filter.description(), "OR(f:a, NOT(*:*), <empty>)~2^2");
    }

    #[test]
    fn test_filter_spec_rejects_unknown_type() {
        assert!(FilterSpec::from_json_str(r#"{"type": "phrase"}"#).is_err());
    }

    #[test]
    fn test_boxed_filter_clone() {
        let filter: Box<dyn Filter> = FilterSpec::All { boost: 4.0 }.into();
        let copy = filter.clone();
        assert_eq!(copy.boost(), 4.0);
        assert!(copy.as_any().is::<MatchAll>());
    }
}
