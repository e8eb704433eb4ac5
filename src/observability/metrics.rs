//! Simple metrics module for the harvester
//!
//! Records counters and gauges on the `metrics` facade using Prometheus naming
//! conventions. Without an installed recorder every call is a no-op.

use std::fmt;

use crate::domain::Source;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Harvest metrics
    HarvestRecordsFetched,
    HarvestRecordsInvalid,
    HarvestPagesFetched,
    HarvestRequestErrors,

    // Intra-source dedup metrics
    DedupDuplicatesRemoved,
    DedupUnparsableKeys,

    // Publisher filter metrics
    FilterRecordsRemoved,

    // Normalize metrics
    NormalizeRecordsProcessed,
    NormalizeRecordsWithoutDoi,

    // Reconcile metrics
    ReconcileGroupsMerged,
    ReconcilePassthroughRecords,
    ReconcileOutputRecords,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HarvestRecordsFetched => "harvester_harvest_records_fetched_total",
            MetricName::HarvestRecordsInvalid => "harvester_harvest_records_invalid_total",
            MetricName::HarvestPagesFetched => "harvester_harvest_pages_fetched_total",
            MetricName::HarvestRequestErrors => "harvester_harvest_request_errors_total",

            MetricName::DedupDuplicatesRemoved => "harvester_dedup_duplicates_removed_total",
            MetricName::DedupUnparsableKeys => "harvester_dedup_unparsable_keys_total",

            MetricName::FilterRecordsRemoved => "harvester_filter_records_removed_total",

            MetricName::NormalizeRecordsProcessed => "harvester_normalize_records_processed_total",
            MetricName::NormalizeRecordsWithoutDoi => "harvester_normalize_records_without_doi_total",

            MetricName::ReconcileGroupsMerged => "harvester_reconcile_groups_merged_total",
            MetricName::ReconcilePassthroughRecords => "harvester_reconcile_passthrough_records_total",
            MetricName::ReconcileOutputRecords => "harvester_reconcile_output_records",
        }
    }
}

/// Increment a counter labelled with the source it concerns
pub fn emit_source_counter(name: MetricName, source: Source, value: u64) {
    ::metrics::counter!(name.as_str(), "source" => source.label()).increment(value);
}

/// Increment an unlabelled counter
pub fn emit_counter(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

/// Set an unlabelled gauge
pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prometheus_style() {
        let all = [
            MetricName::HarvestRecordsFetched,
            MetricName::DedupUnparsableKeys,
            MetricName::ReconcileGroupsMerged,
            MetricName::ReconcileOutputRecords,
        ];
        for name in all {
            let s = name.to_string();
            assert!(s.starts_with("harvester_"));
            assert!(s.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_emit_without_recorder_is_noop() {
        emit_counter(MetricName::ReconcileGroupsMerged, 3);
        emit_source_counter(MetricName::DedupDuplicatesRemoved, Source::Hal, 1);
        emit_gauge(MetricName::ReconcileOutputRecords, 10.0);
    }
}
