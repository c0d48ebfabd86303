//! Command implementations for the sarissa-query CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::index::memory::{MemoryIndex, MemorySegment};
use crate::index::reader::SegmentReader;
use crate::query::*;
use crate::searcher::Searcher;

/// A document set file: segments of documents, each a map of field to text.
///
/// A `null` document reserves its id and is deleted right away.
type DocumentSet = Vec<Vec<Option<BTreeMap<String, String>>>>;

/// Execute a CLI command.
pub fn execute_command(args: QueryArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => search_index(search_args.clone(), &args),
        Command::Explain(explain_args) => explain_query(explain_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
    }
}

/// Load a JSON document set into a [`MemoryIndex`], one segment per array.
pub fn load_index<P: AsRef<Path>>(path: P) -> Result<MemoryIndex> {
    let content = fs::read_to_string(path.as_ref())?;
    let segments: DocumentSet = serde_json::from_str(&content)?;

    let mut index = MemoryIndex::default();
    for documents in segments {
        let mut builder = MemorySegment::builder();
        let mut deleted = Vec::new();
        for document in documents {
            match document {
                Some(fields) => {
                    builder.add_document(fields);
                }
                None => deleted.push(builder.add_document(std::iter::empty::<(&str, &str)>())),
            }
        }

        let mut segment = builder.build()?;
        for doc in deleted {
            segment.delete(doc)?;
        }
        index.push(segment);
    }

    info!(
        "loaded {} segments from {}",
        index.segments().len(),
        path.as_ref().display()
    );
    Ok(index)
}

fn load_config(path: Option<&Path>) -> Result<QueryConfig> {
    match path {
        Some(path) => QueryConfig::from_json_file(path),
        None => Ok(QueryConfig::default()),
    }
}

fn build_order(sorts: &[SortKind]) -> Order {
    sorts.iter().fold(Order::new(), |order, sort| match sort {
        SortKind::Boost => order.add(BoostSort),
        SortKind::Frequency => order.add(FrequencySort),
    })
}

/// Run a filter against a document set.
fn search_index(args: SearchArgs, cli_args: &QueryArgs) -> Result<()> {
    let index = load_index(&args.index)?;
    let config = load_config(args.config.as_deref())?;
    let filter = FilterSpec::from_json_file(&args.query)?.into_filter();
    let searcher = Searcher::from_arc(Arc::new(index)).with_config(config)?;

    let start_time = Instant::now();
    let (hits, total_hits, sorts) = if args.count {
        (Vec::new(), searcher.count(filter.as_ref())?, Vec::new())
    } else {
        let order = build_order(&args.sort);
        let sorts = order
            .prepare()
            .sort_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let results = searcher.search(filter.as_ref(), &order, args.limit)?;
        (results.hits, results.total_hits, sorts)
    };
    let duration_ms = start_time.elapsed().as_millis() as u64;
    debug!("search finished in {duration_ms}ms");

    let report = SearchReport {
        query: filter.description(),
        sorts,
        hits,
        total_hits,
        duration_ms,
    };
    output_result(
        &format!("Searching {}", args.index.display()),
        &report,
        cli_args,
    )
}

/// Print a filter and, given an index, its prepared tree.
fn explain_query(args: ExplainArgs, cli_args: &QueryArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    config.validate()?;
    let filter = FilterSpec::from_json_file(&args.query)?.into_filter();

    let prepared = match &args.index {
        Some(path) => {
            let index = load_index(path)?;
            let order = PreparedOrder::unordered();
            let prepared = filter.prepare(&PrepareContext::new(&index, &order, &config))?;
            Some(format!("{prepared:#?}"))
        }
        None => None,
    };

    let report = ExplainReport {
        query: filter.description(),
        prepared,
    };
    output_result(
        &format!("Explaining {}", args.query.display()),
        &report,
        cli_args,
    )
}

/// Show per segment statistics of a document set.
fn show_stats(args: StatsArgs, cli_args: &QueryArgs) -> Result<()> {
    let index = load_index(&args.index)?;

    let segments: Vec<SegmentStats> = index
        .segments()
        .iter()
        .enumerate()
        .map(|(ord, segment)| SegmentStats {
            ord,
            max_doc: segment.max_doc(),
            live_documents: segment.docs_count(),
            fields: segment
                .fields()
                .map(|field| (field.to_string(), segment.terms_count(field)))
                .collect(),
        })
        .collect();

    let stats = IndexStats {
        total_documents: segments.iter().map(|segment| segment.live_documents).sum(),
        segments,
    };
    output_result(
        &format!("Statistics for {}", args.index.display()),
        &stats,
        cli_args,
    )
}
