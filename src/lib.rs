pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod types;

// Application layer wiring sources to the pipeline
pub mod app;

// Domain data shapes shared across layers
pub mod domain;

pub use domain::{Author, CanonicalWork, Source};
pub use pipeline::{reconcile, reconcile_with_report, PipelineOptions};
pub use types::RawWorkData;
