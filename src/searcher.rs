//! Searcher implementation for executing filters against an index.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::collector::{Collector, CountCollector, TopDocsCollector};
use crate::query::config::QueryConfig;
use crate::query::filter::Filter;
use crate::query::prepared::{ExecutionContext, PrepareContext, PreparedQuery};
use crate::query::score::{Order, PreparedOrder};
use crate::query::SearchResults;

/// A searcher that executes filters against an index reader.
#[derive(Debug)]
pub struct Searcher {
    /// The index reader to search against.
    reader: Arc<dyn IndexReader>,
    config: QueryConfig,
}

impl Searcher {
    /// Create a new searcher with the given index reader.
    pub fn new(reader: Box<dyn IndexReader>) -> Self {
        Self::from_arc(Arc::from(reader))
    }

    /// Create a new searcher with an `Arc<dyn IndexReader>`.
    pub fn from_arc(reader: Arc<dyn IndexReader>) -> Self {
        Searcher {
            reader,
            config: QueryConfig::default(),
        }
    }

    /// Replace the query configuration.
    pub fn with_config(mut self, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Get the index reader.
    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Compile `filter` against the index.
    pub fn prepare(
        &self,
        filter: &dyn Filter,
        order: &Arc<PreparedOrder>,
    ) -> Result<Box<dyn PreparedQuery>> {
        filter.prepare(&PrepareContext::new(
            self.reader.as_ref(),
            order,
            &self.config,
        ))
    }

    /// Execute a search with a custom collector.
    ///
    /// Every segment is iterated in order; deleted documents are skipped.
    pub fn search_with_collector<C: Collector>(
        &self,
        filter: &dyn Filter,
        order: &Arc<PreparedOrder>,
        mut collector: C,
    ) -> Result<C> {
        let prepared = self.prepare(filter, order)?;
        let needs_scores = collector.needs_scores();
        let mut score = order.new_buffer();

        for ord in 0..self.reader.segments_count() {
            let Some(segment) = self.reader.segment(ord) else {
                continue;
            };
            let ctx = ExecutionContext::new(segment, order, &self.config);
            let mut it = prepared.execute(&ctx)?;

            while it.next() {
                let doc_id = it.value();
                if !segment.is_live(doc_id) {
                    continue;
                }
                if needs_scores {
                    score.clear();
                    it.evaluate(&mut score);
                }
                collector.collect(ord, doc_id, &score)?;
            }
        }

        debug!(
            "{} matched {} documents",
            filter.description(),
            collector.total_hits()
        );
        Ok(collector)
    }

    /// Return the `limit` best documents under `order`.
    pub fn search(&self, filter: &dyn Filter, order: &Order, limit: usize) -> Result<SearchResults> {
        let order = order.prepare();
        let collector =
            self.search_with_collector(filter, &order, TopDocsCollector::new(limit, Arc::clone(&order)))?;
        Ok(SearchResults {
            hits: collector.results(),
            total_hits: collector.total_hits(),
        })
    }

    /// Count the live documents matching `filter`.
    pub fn count(&self, filter: &dyn Filter) -> Result<u64> {
        let collector =
            self.search_with_collector(filter, &PreparedOrder::unordered(), CountCollector::new())?;
        Ok(collector.count())
    }
}
