//! In-memory segments and index.

use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;

use crate::error::{QueryError, Result};
use crate::index::reader::{IndexReader, Postings, SegmentReader};
use crate::query::iterator::{DocId, doc_limits};

type FieldPostings = AHashMap<String, AHashMap<String, Arc<Postings>>>;

/// An immutable in-memory segment with a live-documents bitmap.
#[derive(Debug, Default)]
pub struct MemorySegment {
    fields: FieldPostings,
    max_doc: DocId,
    /// Bit `doc` is set while `doc` is live.
    live_docs: Arc<BitVec>,
}

impl MemorySegment {
    pub fn builder() -> MemorySegmentBuilder {
        MemorySegmentBuilder::new()
    }

    /// Mark `doc` as deleted.
    pub fn delete(&mut self, doc: DocId) -> Result<()> {
        if !doc_limits::valid(doc) || doc > self.max_doc {
            return Err(QueryError::index(format!(
                "document {doc} does not exist in a segment of {} documents",
                self.max_doc
            )));
        }
        Arc::make_mut(&mut self.live_docs).set(doc as usize, false);
        Ok(())
    }

    /// Field names present in this segment.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of distinct terms of `field`.
    pub fn terms_count(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, |terms| terms.len())
    }
}

impl SegmentReader for MemorySegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn docs_count(&self) -> u64 {
        self.live_docs.iter().filter(|&live| live).count() as u64
    }

    fn is_live(&self, doc: DocId) -> bool {
        self.live_docs.get(doc as usize).unwrap_or(false)
    }

    fn live_docs(&self) -> Arc<BitVec> {
        Arc::clone(&self.live_docs)
    }

    fn postings(&self, field: &str, term: &str) -> Option<Arc<Postings>> {
        self.fields.get(field)?.get(term).cloned()
    }
}

/// Accumulates documents or raw posting lists into a [`MemorySegment`].
#[derive(Debug, Default)]
pub struct MemorySegmentBuilder {
    terms: AHashMap<String, AHashMap<String, Vec<(DocId, u32)>>>,
    max_doc: DocId,
}

impl MemorySegmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document made of `(field, text)` pairs and return its id.
    ///
    /// Text is split on whitespace and lowercased; repeated tokens raise the
    /// term frequency.
    pub fn add_document<I, F, T>(&mut self, fields: I) -> DocId
    where
        I: IntoIterator<Item = (F, T)>,
        F: AsRef<str>,
        T: AsRef<str>,
    {
        self.max_doc += 1;
        let doc = self.max_doc;

        for (field, text) in fields {
            let terms = self.terms.entry(field.as_ref().to_string()).or_default();
            for token in text.as_ref().split_whitespace() {
                terms.entry(token.to_lowercase()).or_default().push((doc, 1));
            }
        }

        doc
    }

    /// Add a raw posting list for `term` in `field`.
    ///
    /// Documents not yet assigned grow the segment so that every id up to the
    /// largest one listed exists.
    pub fn add_postings(&mut self, field: &str, term: &str, docs: &[DocId]) -> &mut Self {
        if let Some(&max) = docs.iter().filter(|&&doc| doc_limits::valid(doc)).max() {
            self.max_doc = self.max_doc.max(max);
        }
        self.terms
            .entry(field.to_string())
            .or_default()
            .entry(term.to_string())
            .or_default()
            .extend(docs.iter().map(|&doc| (doc, 1)));
        self
    }

    /// Ensure the segment spans at least `max_doc` documents.
    pub fn with_max_doc(mut self, max_doc: DocId) -> Self {
        self.max_doc = self.max_doc.max(max_doc);
        self
    }

    pub fn build(self) -> Result<MemorySegment> {
        if self.max_doc == doc_limits::EOF {
            return Err(QueryError::index("segment exceeds the document id space"));
        }

        let mut fields = FieldPostings::default();
        for (field, terms) in self.terms {
            let mut built = AHashMap::with_capacity(terms.len());
            for (term, entries) in terms {
                built.insert(term, Arc::new(Postings::new(entries)?));
            }
            fields.insert(field, built);
        }

        let mut live_docs = BitVec::from_elem(self.max_doc as usize + 1, true);
        live_docs.set(doc_limits::INVALID as usize, false);

        Ok(MemorySegment {
            fields,
            max_doc: self.max_doc,
            live_docs: Arc::new(live_docs),
        })
    }
}

/// An index made of in-memory segments.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    segments: Vec<MemorySegment>,
}

impl MemoryIndex {
    pub fn new(segments: Vec<MemorySegment>) -> Self {
        MemoryIndex { segments }
    }

    pub fn push(&mut self, segment: MemorySegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[MemorySegment] {
        &self.segments
    }

    pub fn segment_mut(&mut self, ord: usize) -> Option<&mut MemorySegment> {
        self.segments.get_mut(ord)
    }
}

impl IndexReader for MemoryIndex {
    fn segments_count(&self) -> usize {
        self.segments.len()
    }

    fn segment(&self, ord: usize) -> Option<&dyn SegmentReader> {
        self.segments
            .get(ord)
            .map(|segment| segment as &dyn SegmentReader)
    }
}
