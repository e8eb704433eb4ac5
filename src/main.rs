use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use biblio_harvester::apis::create_source;
use biblio_harvester::app::{pipeline_options, HarvestUseCase, RawHarvest, SourceFailure};
use biblio_harvester::config::{Config, OutputFormat};
use biblio_harvester::constants;
use biblio_harvester::domain::Source;
use biblio_harvester::logging;
use biblio_harvester::output;
use biblio_harvester::pipeline::{ReconcileOutput, RunReport};

#[derive(Parser)]
#[command(name = "biblio_harvester")]
#[command(about = "Harvest bibliographic records from OpenAlex, Crossref and HAL and reconcile them by DOI")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults apply when it is missing)
    #[arg(long, global = true, default_value = biblio_harvester::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source live, reconcile and write the result
    Harvest {
        /// Sources to fetch (comma-separated). Available: openalex, crossref, hal
        #[arg(long)]
        sources: Option<String>,
        /// Output path without extension
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Keep every Crossref record regardless of publisher
        #[arg(long)]
        no_publisher_filter: bool,
    },
    /// Reconcile previously saved raw dumps
    Reconcile {
        #[arg(long)]
        openalex: Option<PathBuf>,
        #[arg(long)]
        crossref: Option<PathBuf>,
        #[arg(long)]
        hal: Option<PathBuf>,
        /// Output path without extension
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Keep every Crossref record regardless of publisher
        #[arg(long)]
        no_publisher_filter: bool,
    },
    /// Download one source's validated raw records to a JSON file
    Fetch {
        /// One of: openalex, crossref, hal
        #[arg(long)]
        source: String,
        #[arg(long)]
        output: PathBuf,
    },
}

fn parse_sources(list: Option<&str>) -> Result<Vec<Source>> {
    let Some(list) = list else {
        return Ok(Source::ALL.to_vec());
    };
    let mut sources = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Source::from_cli_name(name) {
            Some(source) if !sources.contains(&source) => sources.push(source),
            Some(_) => {}
            None => bail!(
                "Unknown source '{}'. Available: {}",
                name,
                constants::get_supported_sources().join(", ")
            ),
        }
    }
    Ok(sources)
}

fn load_dump(path: Option<&Path>, source: Source) -> Result<Vec<biblio_harvester::RawWorkData>> {
    match path {
        Some(path) => output::read_raw_dump(path)
            .with_context(|| format!("Failed to read {} dump from {}", source, path.display())),
        None => {
            warn!("No {} dump given; treating the source as empty", source);
            Ok(Vec::new())
        }
    }
}

fn persist(
    config: &Config,
    output_path: Option<PathBuf>,
    format: Option<OutputFormat>,
    result: &ReconcileOutput,
) -> Result<()> {
    let stem = output_path.unwrap_or_else(|| PathBuf::from(&config.output.path));
    let format = format.unwrap_or(config.output.format);
    let written = output::write_works(&stem, format, &result.works)
        .with_context(|| format!("Failed to write results to {}", stem.display()))?;
    let manifest = output::RunManifest::new(&config.search, &result.report);
    let report_path = output::write_manifest(&stem, &manifest)
        .with_context(|| format!("Failed to write run report next to {}", stem.display()))?;
    for path in written {
        println!("   Output file: {}", path.display());
    }
    println!("   Run report: {}", report_path.display());
    Ok(())
}

fn print_summary(report: &RunReport, failures: &[SourceFailure]) {
    println!("\n📊 Reconciliation Results:");
    for source in &report.sources {
        println!(
            "   {}: {} raw, {} duplicates, {} unparsable, {} filtered, {} works",
            source.source,
            source.raw_records,
            source.duplicates_removed,
            source.unparsable.len(),
            source.filtered_out,
            source.canonical_records
        );
    }
    for failure in failures {
        println!("   ⚠️  {} failed: {}", failure.source, failure.message);
    }
    let stats = &report.reconcile;
    println!("   DOI groups: {} ({} merged)", stats.groups, stats.merged_groups);
    println!("   Records without DOI: {}", stats.no_doi_records);
    println!("   Final records: {}", stats.output_records);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    info!(
        "Search '{}' from {} to {}",
        config.search.term, config.search.start_year, config.search.end_year
    );

    match cli.command {
        Commands::Harvest {
            sources,
            output,
            format,
            no_publisher_filter,
        } => {
            let sources = parse_sources(sources.as_deref())?;
            let use_case = HarvestUseCase::from_config(&config, &sources, !no_publisher_filter)
                .context("Failed to build API clients")?;
            let outcome = use_case.run().await;
            print_summary(&outcome.output.report, &outcome.failures);
            persist(&config, output, format, &outcome.output)?;
        }
        Commands::Reconcile {
            openalex,
            crossref,
            hal,
            output,
            format,
            no_publisher_filter,
        } => {
            let harvest = RawHarvest {
                openalex: load_dump(openalex.as_deref(), Source::OpenAlex)?,
                crossref: load_dump(crossref.as_deref(), Source::Crossref)?,
                hal: load_dump(hal.as_deref(), Source::Hal)?,
            };
            let result = harvest.reconcile(&pipeline_options(&config, !no_publisher_filter));
            print_summary(&result.report, &[]);
            persist(&config, output, format, &result)?;
        }
        Commands::Fetch { source, output: path } => {
            let source = Source::from_cli_name(&source).with_context(|| {
                format!(
                    "Unknown source '{}'. Available: {}",
                    source,
                    constants::get_supported_sources().join(", ")
                )
            })?;
            let client = create_source(source, &config).context("Failed to build API client")?;
            let records = client
                .fetch_works()
                .await
                .with_context(|| format!("Failed to fetch {}", source))?;
            output::write_raw_dump(&path, &records)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("\n📥 {}: {} raw records saved to {}", source, records.len(), path.display());
        }
    }

    Ok(())
}
