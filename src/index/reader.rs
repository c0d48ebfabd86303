//! Index reader traits consumed by the query algebra.
//!
//! The query layer never touches on-disk formats. It only needs, per segment,
//! the universe of live documents and a sorted posting list per term.

use std::fmt::Debug;
use std::sync::Arc;

use bit_vec::BitVec;

use crate::error::{QueryError, Result};
use crate::query::iterator::{DocId, doc_limits};

/// A materialised posting list: strictly ascending doc ids with frequencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postings {
    docs: Vec<DocId>,
    freqs: Vec<u32>,
}

impl Postings {
    /// Build a posting list from `(doc, freq)` pairs in any order.
    ///
    /// Duplicate documents are merged by summing their frequencies. The
    /// reserved `INVALID` and `EOF` ids are rejected.
    pub fn new(mut entries: Vec<(DocId, u32)>) -> Result<Self> {
        if let Some(&(doc, _)) = entries.iter().find(|(doc, _)| !doc_limits::valid(*doc)) {
            return Err(QueryError::index(format!(
                "document id {doc} is reserved and cannot appear in a posting list"
            )));
        }

        entries.sort_unstable_by_key(|&(doc, _)| doc);

        let mut docs: Vec<DocId> = Vec::with_capacity(entries.len());
        let mut freqs: Vec<u32> = Vec::with_capacity(entries.len());
        for (doc, freq) in entries {
            match docs.last() {
                Some(&last) if last == doc => {
                    if let Some(total) = freqs.last_mut() {
                        *total = total.saturating_add(freq);
                    }
                }
                _ => {
                    docs.push(doc);
                    freqs.push(freq);
                }
            }
        }

        Ok(Postings { docs, freqs })
    }

    /// Build a posting list where every document occurs once.
    pub fn from_docs(docs: &[DocId]) -> Result<Self> {
        Self::new(docs.iter().map(|&doc| (doc, 1)).collect())
    }

    pub fn docs(&self) -> &[DocId] {
        &self.docs
    }

    pub fn freqs(&self) -> &[u32] {
        &self.freqs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Read access to one index segment.
pub trait SegmentReader: Send + Sync + Debug {
    /// Highest document id assigned in this segment.
    ///
    /// Documents are numbered `doc_limits::MIN..=max_doc`.
    fn max_doc(&self) -> DocId;

    /// Number of live documents.
    fn docs_count(&self) -> u64;

    /// Whether `doc` exists and has not been deleted.
    fn is_live(&self, doc: DocId) -> bool;

    /// Snapshot of the live-documents bitmap, indexed by document id.
    fn live_docs(&self) -> Arc<BitVec>;

    /// Posting list of `term` in `field`, if the term occurs in the segment.
    fn postings(&self, field: &str, term: &str) -> Option<Arc<Postings>>;

    /// Number of live documents containing `term` in `field`.
    fn term_doc_freq(&self, field: &str, term: &str) -> u64 {
        self.postings(field, term)
            .map(|postings| {
                postings
                    .docs()
                    .iter()
                    .filter(|&&doc| self.is_live(doc))
                    .count() as u64
            })
            .unwrap_or(0)
    }
}

/// Read access to an ordered collection of segments.
pub trait IndexReader: Send + Sync + Debug {
    /// Number of segments.
    fn segments_count(&self) -> usize;

    /// Segment by ordinal.
    fn segment(&self, ord: usize) -> Option<&dyn SegmentReader>;

    /// Number of live documents across all segments.
    fn docs_count(&self) -> u64 {
        (0..self.segments_count())
            .filter_map(|ord| self.segment(ord))
            .map(|segment| segment.docs_count())
            .sum()
    }

    /// Live documents containing `term` in `field` across all segments.
    fn term_doc_freq(&self, field: &str, term: &str) -> u64 {
        (0..self.segments_count())
            .filter_map(|ord| self.segment(ord))
            .map(|segment| segment.term_doc_freq(field, term))
            .sum()
    }
}
