// Application layer: orchestrates harvest collaborators around the reconciliation core

pub mod harvest_use_case;

pub use harvest_use_case::{pipeline_options, HarvestOutcome, HarvestUseCase, RawHarvest, SourceFailure};
