pub mod merge_policy;

pub use merge_policy::{Field, MergePolicy, MergeStrategy, PolicyError, FIELD_POLICIES};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{CanonicalWork, Source};
use crate::observability::metrics::{emit_counter, emit_gauge, MetricName};

static DOI_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(dx\.)?doi\.org/").expect("DOI prefix pattern is valid"));

/// Violations of the reconciler's output invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("normalized DOI '{doi}' appears in more than one output record")]
    DuplicateDoi { doi: String },
}

/// Grouping key for cross-source matching.
///
/// Lower-cases, trims and strips a leading `http(s)://(dx.)doi.org/`.
/// Returns `None` when nothing is left.
pub fn normalize_doi(doi: &str) -> Option<String> {
    let lowered = doi.trim().to_lowercase();
    let key = DOI_PREFIX_RE.replace(&lowered, "").trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Check that no two records share a non-empty normalized DOI
pub fn verify_unique_dois(works: &[CanonicalWork]) -> Result<(), ReconcileError> {
    let mut seen = HashSet::new();
    for key in works.iter().filter_map(|w| w.doi.as_deref().and_then(normalize_doi)) {
        if !seen.insert(key.clone()) {
            return Err(ReconcileError::DuplicateDoi { doi: key });
        }
    }
    Ok(())
}

/// Counts describing one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub input_records: usize,
    pub doi_records: usize,
    pub no_doi_records: usize,
    /// Distinct normalized DOIs
    pub groups: usize,
    /// Groups with more than one member
    pub merged_groups: usize,
    pub output_records: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub works: Vec<CanonicalWork>,
    pub stats: ReconcileStats,
}

/// Merges records from all sources that share a normalized DOI
pub struct Reconciler {
    policy: MergePolicy,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::with_policy(MergePolicy::standard())
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Group by normalized DOI, merge every group, and pass DOI-less records through.
    ///
    /// Output: merged groups in ascending DOI order, then the untouched records
    /// in their original relative order.
    pub fn reconcile(&self, works: Vec<CanonicalWork>) -> Reconciliation {
        let input_records = works.len();
        let mut groups: BTreeMap<String, Vec<CanonicalWork>> = BTreeMap::new();
        let mut passthrough = Vec::new();

        for mut work in works {
            match work.doi.as_deref().and_then(normalize_doi) {
                Some(key) => {
                    work.doi = Some(key.clone());
                    groups.entry(key).or_default().push(work);
                }
                None => passthrough.push(work),
            }
        }

        let doi_records = input_records - passthrough.len();
        info!(
            "Reconciling {} records: {} with a DOI, {} without",
            input_records,
            doi_records,
            passthrough.len()
        );

        let group_count = groups.len();
        let mut merged_groups = 0usize;
        let mut output = Vec::with_capacity(group_count + passthrough.len());

        for (key, mut members) in groups {
            if members.len() > 1 {
                merged_groups += 1;
                debug!(
                    "Merging {} records for DOI {} from [{}]",
                    members.len(),
                    key,
                    members.iter().map(|w| w.source_db.as_str()).collect::<Vec<_>>().join(", ")
                );
            }
            // Stable: equal-priority members keep their input order
            members.sort_by_key(|w| Source::priority_of_label(&w.source_db));
            let merged = self.policy.merge(&members);
            debug_assert!(
                merged.doi.as_deref().is_some_and(|d| !d.is_empty()),
                "merged group {} lost its DOI",
                key
            );
            output.push(merged);
        }

        let no_doi_records = passthrough.len();
        output.extend(passthrough);

        debug_assert!(verify_unique_dois(&output).is_ok(), "reconciled output repeats a DOI");

        emit_counter(MetricName::ReconcileGroupsMerged, merged_groups as u64);
        emit_counter(MetricName::ReconcilePassthroughRecords, no_doi_records as u64);
        emit_gauge(MetricName::ReconcileOutputRecords, output.len() as f64);
        info!(
            "Merge complete: {} DOI groups ({} merged across records), {} final records",
            group_count,
            merged_groups,
            output.len()
        );

        let stats = ReconcileStats {
            input_records,
            doi_records,
            no_doi_records,
            groups: group_count,
            merged_groups,
            output_records: output.len(),
        };
        Reconciliation { works: output, stats }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
