//! End-to-end aggregation pipeline.
//!
//! Pairs the log files, parses every pair, filters and accumulates the
//! samples, and returns the merged [`StatsTable`] ready for the report
//! layer.

use std::path::Path;

use scope_core::models::{Selector, StatsTable};
use scope_core::settings::{AnalysisOptions, ParsePolicy};
use scope_core::{Result, ScopeError};
use tracing::{debug, info, warn};

use crate::aggregator::SampleAggregator;
use crate::parser::parse_file_pair;
use crate::reader::{discover_file_pairs, FilePair};

// ── Public types ──────────────────────────────────────────────────────────────

/// The complete output of [`analyze_logs`].
#[derive(Debug)]
pub struct AnalysisResult {
    /// Merged statistics.
    pub table: StatsTable,
    /// File pairs that were parsed successfully.
    pub pairs_processed: usize,
    /// Samples parsed from those pairs, before filtering.
    pub samples_read: usize,
    /// Samples that passed the selector, before merging.
    pub samples_kept: usize,
    /// File pairs dropped because of a parse error.
    pub skipped: Vec<ScopeError>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline on `source_dir`.
pub fn analyze_logs(
    source_dir: &Path,
    selector: Selector,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let pairs = discover_file_pairs(source_dir, options.pairing)?;
    info!(
        "Analysing {} file pairs in {}",
        pairs.len(),
        source_dir.display()
    );
    analyze_pairs(&pairs, selector, options)
}

/// Run the pipeline on already-paired files.
///
/// Each pair is parsed on its own. Under [`ParsePolicy::SkipPair`] a pair
/// with a malformed line contributes nothing and its error is kept in
/// [`AnalysisResult::skipped`]; under [`ParsePolicy::Abort`] the error is
/// returned. I/O failures are handled the same way as parse failures.
pub fn analyze_pairs(
    pairs: &[FilePair],
    selector: Selector,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let mut aggregator = SampleAggregator::new(selector);
    let mut skipped: Vec<ScopeError> = Vec::new();
    let mut pairs_processed = 0usize;

    for pair in pairs {
        match parse_file_pair(pair) {
            Ok(samples) => {
                aggregator.extend(&samples);
                pairs_processed += 1;
            }
            Err(e) => match options.parse_policy {
                ParsePolicy::Abort => return Err(e),
                ParsePolicy::SkipPair => {
                    warn!("Skipping second {}: {}", pair.second, e);
                    skipped.push(e);
                }
            },
        }
    }

    let samples_read = aggregator.seen();
    let samples_kept = aggregator.kept();
    let table = aggregator.finish(options.row_order);

    debug!(
        "{} pairs parsed, {} skipped; {} samples read, {} kept, {} rows after merge",
        pairs_processed,
        skipped.len(),
        samples_read,
        samples_kept,
        table.len()
    );

    Ok(AnalysisResult {
        table,
        pairs_processed,
        samples_read,
        samples_kept,
        skipped,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
