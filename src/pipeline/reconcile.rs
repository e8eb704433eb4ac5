use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::domain::{CanonicalWork, Source};
use crate::pipeline::processing::conflation::{MergePolicy, ReconcileStats, Reconciler};
use crate::pipeline::processing::dedup::{Deduplicator, UnparsableRecord};
use crate::pipeline::processing::filter::PublisherFilter;
use crate::pipeline::processing::normalize::NormalizationRegistry;
use crate::types::RawWorkData;

/// Knobs for a reconciliation run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Applied to Crossref records after dedup; `None` keeps everything
    pub publisher_filter: Option<PublisherFilter>,
    pub merge_policy: MergePolicy,
}

/// What happened to one source's records before the cross-source merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: Source,
    pub raw_records: usize,
    pub duplicates_removed: usize,
    pub unparsable: Vec<UnparsableRecord>,
    pub filtered_out: usize,
    pub canonical_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub reconcile: ReconcileStats,
}

#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    pub works: Vec<CanonicalWork>,
    pub report: RunReport,
}

/// Reconcile the three sources' raw records into deduplicated canonical works.
pub fn reconcile(
    openalex_raw: Vec<RawWorkData>,
    crossref_raw: Vec<RawWorkData>,
    hal_raw: Vec<RawWorkData>,
) -> Vec<CanonicalWork> {
    reconcile_with_report(openalex_raw, crossref_raw, hal_raw, &PipelineOptions::default()).works
}

/// Same as [`reconcile`], also returning per-source and merge counts
pub fn reconcile_with_report(
    openalex_raw: Vec<RawWorkData>,
    crossref_raw: Vec<RawWorkData>,
    hal_raw: Vec<RawWorkData>,
    options: &PipelineOptions,
) -> ReconcileOutput {
    let registry = NormalizationRegistry::new();

    let (openalex, openalex_report) = prepare_source(Source::OpenAlex, openalex_raw, options, &registry);
    let (crossref, crossref_report) = prepare_source(Source::Crossref, crossref_raw, options, &registry);
    let (hal, hal_report) = prepare_source(Source::Hal, hal_raw, options, &registry);

    let mut combined = Vec::with_capacity(openalex.len() + hal.len() + crossref.len());
    combined.extend(openalex);
    combined.extend(hal);
    combined.extend(crossref);

    let reconciliation = Reconciler::with_policy(options.merge_policy.clone()).reconcile(combined);

    ReconcileOutput {
        works: reconciliation.works,
        report: RunReport {
            sources: vec![openalex_report, crossref_report, hal_report],
            reconcile: reconciliation.stats,
        },
    }
}

/// Dedup, filter (Crossref only) and normalize one source's raw records
pub fn prepare_source(
    source: Source,
    raws: Vec<RawWorkData>,
    options: &PipelineOptions,
    registry: &NormalizationRegistry,
) -> (Vec<CanonicalWork>, SourceReport) {
    let span = info_span!("prepare_source", source = %source);
    let _enter = span.enter();

    let raw_records = raws.len();
    let outcome = Deduplicator::for_source(source).dedup(raws);

    let (kept, filtered_out) = match (&options.publisher_filter, source) {
        (Some(filter), Source::Crossref) if filter.is_enabled() => filter.apply(outcome.records),
        _ => (outcome.records, 0),
    };

    let works = match registry.normalize_batch(source, &kept) {
        Some(works) => works,
        None => {
            warn!("No normalizer registered for {}; skipping {} records", source, kept.len());
            Vec::new()
        }
    };
    info!("{}: {} raw records -> {} canonical works", source, raw_records, works.len());

    let report = SourceReport {
        source,
        raw_records,
        duplicates_removed: outcome.duplicates_removed,
        unparsable: outcome.unparsable,
        filtered_out,
        canonical_records: works.len(),
    };
    (works, report)
}
