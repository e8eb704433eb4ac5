// Observability: metrics counters for each pipeline stage

pub mod metrics;

pub use metrics::{emit_counter, emit_gauge, emit_source_counter, MetricName};
