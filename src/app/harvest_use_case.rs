use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::Config;
use crate::domain::Source;
use crate::error::Result;
use crate::pipeline::processing::filter::PublisherFilter;
use crate::pipeline::{reconcile_with_report, PipelineOptions, ReconcileOutput};
use crate::types::{RawWorkData, WorkSource};

/// Raw records per source, ready for reconciliation
#[derive(Debug, Clone, Default)]
pub struct RawHarvest {
    pub openalex: Vec<RawWorkData>,
    pub crossref: Vec<RawWorkData>,
    pub hal: Vec<RawWorkData>,
}

impl RawHarvest {
    pub fn records_mut(&mut self, source: Source) -> &mut Vec<RawWorkData> {
        match source {
            Source::OpenAlex => &mut self.openalex,
            Source::Crossref => &mut self.crossref,
            Source::Hal => &mut self.hal,
        }
    }

    pub fn total(&self) -> usize {
        self.openalex.len() + self.crossref.len() + self.hal.len()
    }

    pub fn reconcile(self, options: &PipelineOptions) -> ReconcileOutput {
        reconcile_with_report(self.openalex, self.crossref, self.hal, options)
    }
}

/// A source whose harvest failed outright; it contributes nothing to the run
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: Source,
    pub message: String,
}

pub struct HarvestOutcome {
    pub output: ReconcileOutput,
    pub failures: Vec<SourceFailure>,
}

/// Build pipeline options from configuration
pub fn pipeline_options(config: &Config, publisher_filter: bool) -> PipelineOptions {
    PipelineOptions {
        publisher_filter: publisher_filter.then(|| PublisherFilter::new(&config.filter.publisher_keywords)),
        ..Default::default()
    }
}

/// Use case for fetching every configured source and reconciling the result
pub struct HarvestUseCase {
    sources: Vec<Arc<dyn WorkSource>>,
    options: PipelineOptions,
}

impl HarvestUseCase {
    pub fn new(sources: Vec<Arc<dyn WorkSource>>, options: PipelineOptions) -> Self {
        Self { sources, options }
    }

    /// Live clients for `sources`, built from configuration
    pub fn from_config(config: &Config, sources: &[Source], publisher_filter: bool) -> Result<Self> {
        let clients = sources
            .iter()
            .map(|&source| crate::apis::create_source(source, config).map(Arc::from))
            .collect::<Result<Vec<Arc<dyn WorkSource>>>>()?;
        Ok(Self::new(clients, pipeline_options(config, publisher_filter)))
    }

    /// Fetch all sources concurrently. A source that fails is logged and left empty.
    pub async fn fetch_all(&self) -> (RawHarvest, Vec<SourceFailure>) {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|client| {
                let client = Arc::clone(client);
                let source = client.source();
                (source, tokio::spawn(async move { client.fetch_works().await }))
            })
            .collect();

        let mut harvest = RawHarvest::default();
        let mut failures = Vec::new();
        for (source, handle) in handles {
            let message = match handle.await {
                Ok(Ok(records)) => {
                    info!("{}: {} raw records fetched", source, records.len());
                    harvest.records_mut(source).extend(records);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(join_error) => format!("fetch task aborted: {}", join_error),
            };
            error!("{}: harvest failed, continuing without it: {}", source, message);
            failures.push(SourceFailure { source, message });
        }
        (harvest, failures)
    }

    pub async fn run(&self) -> HarvestOutcome {
        let started = Instant::now();
        let (harvest, failures) = self.fetch_all().await;
        info!("Fetched {} raw records in {:?}", harvest.total(), started.elapsed());

        let output = harvest.reconcile(&self.options);
        info!(
            "Reconciled into {} works ({} merged groups)",
            output.works.len(),
            output.report.reconcile.merged_groups
        );
        HarvestOutcome { output, failures }
    }
}
