//! Attributes attached to a document iterator.

use crate::query::cost::CostHandle;
use crate::query::iterator::{DocId, doc_limits};
use crate::query::score::{NO_SCORE, Score};

/// Current position of an iterator, updated in place by `next`/`seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub value: DocId,
}

impl Document {
    pub const fn new() -> Self {
        Document {
            value: doc_limits::INVALID,
        }
    }

    pub const fn eof() -> Self {
        Document {
            value: doc_limits::EOF,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of occurrences of a term in the current document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frequency {
    pub value: u32,
}

/// Borrowed view of an iterator's attributes.
///
/// The referenced attributes are owned by the iterator, so repeated calls to
/// `attributes()` hand out the same instances for the iterator's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Attributes<'a> {
    pub document: &'a Document,
    pub cost: &'a CostHandle,
    /// Absent for unordered iterators.
    pub score: Option<&'a Score>,
    /// Present on term postings only.
    pub frequency: Option<&'a Frequency>,
}

impl<'a> Attributes<'a> {
    pub fn new(document: &'a Document, cost: &'a CostHandle) -> Self {
        Attributes {
            document,
            cost,
            score: None,
            frequency: None,
        }
    }

    pub fn with_score(mut self, score: Option<&'a Score>) -> Self {
        self.score = score;
        self
    }

    pub fn with_frequency(mut self, frequency: &'a Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// The score, or the no-op singleton when scoring is not configured.
    pub fn score_or_default(&self) -> &'a Score {
        self.score.unwrap_or(&NO_SCORE)
    }
}
