// Reconciliation pipeline: per-source preparation and cross-source merge

pub mod processing;
pub mod reconcile;

// Re-export the entry points
pub use reconcile::{reconcile, reconcile_with_report, PipelineOptions, ReconcileOutput, RunReport, SourceReport};
