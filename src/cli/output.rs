//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, QueryArgs};
use crate::error::Result;
use crate::query::SearchHit;

/// A command result that knows how to print itself for humans.
pub trait Report: Serialize {
    fn print_human(&self, args: &QueryArgs);
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchReport {
    /// Description of the filter that ran.
    pub query: String,
    /// Names of the sorts hits are ranked by.
    pub sorts: Vec<String>,
    pub hits: Vec<SearchHit>,
    pub total_hits: u64,
    pub duration_ms: u64,
}

/// Result structure for explain.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainReport {
    pub query: String,
    /// Debug rendering of the prepared tree; absent without an index.
    pub prepared: Option<String>,
}

/// Document set statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: u64,
    pub segments: Vec<SegmentStats>,
}

/// Per segment statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentStats {
    pub ord: usize,
    pub max_doc: u32,
    pub live_documents: u64,
    /// Distinct terms per field.
    pub fields: BTreeMap<String, usize>,
}

impl Report for SearchReport {
    fn print_human(&self, args: &QueryArgs) {
        if args.verbosity() > 1 {
            println!("Query: {}", self.query);
            if !self.sorts.is_empty() {
                println!("Sorted by: {}", self.sorts.join(", "));
            }
            println!();
        }

        println!("Search Results:");
        println!("═══════════════");
        for (i, hit) in self.hits.iter().enumerate() {
            let scores = format_scores(&hit.scores);
            if scores.is_empty() {
                println!("{:>3}. segment {} doc {}", i + 1, hit.segment, hit.doc_id);
            } else {
                println!(
                    "{:>3}. segment {} doc {} (score: {scores})",
                    i + 1,
                    hit.segment,
                    hit.doc_id
                );
            }
        }

        println!();
        println!("Total hits: {}", self.total_hits);
        println!("Search time: {}ms", self.duration_ms);
    }
}

impl Report for ExplainReport {
    fn print_human(&self, _args: &QueryArgs) {
        println!("Query: {}", self.query);
        if let Some(prepared) = &self.prepared {
            println!();
            println!("Prepared:");
            println!("─────────");
            println!("{prepared}");
        }
    }
}

impl Report for IndexStats {
    fn print_human(&self, _args: &QueryArgs) {
        println!("Index Statistics:");
        println!("════════════════");
        println!("Total documents: {}", self.total_documents);
        println!("Number of segments: {}", self.segments.len());

        for segment in &self.segments {
            println!();
            println!(
                "Segment {}: {} live of {} documents",
                segment.ord, segment.live_documents, segment.max_doc
            );
            for (field, terms) in &segment.fields {
                println!("  {field}: {terms} terms");
            }
        }
    }
}

/// Output a command result in the requested format.
pub fn output_result<T: Report>(message: &str, result: &T, args: &QueryArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Report>(message: &str, result: &T, args: &QueryArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    result.print_human(args);
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &QueryArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

fn format_scores(scores: &[f64]) -> String {
    scores
        .iter()
        .map(|score| format!("{score:.3}"))
        .collect::<Vec<_>>()
        .join(", ")
}
