//! Writing reconciled works and raw dumps to disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::{OutputFormat, SearchConfig};
use crate::domain::CanonicalWork;
use crate::error::{HarvestError, Result};
use crate::pipeline::RunReport;
use crate::types::RawWorkData;

/// CSV header, in canonical field order
pub const CSV_COLUMNS: [&str; 14] = [
    "doi",
    "title",
    "authors",
    "year",
    "publication_date",
    "journal_name",
    "publisher",
    "work_type",
    "abstract",
    "subjects",
    "source_url",
    "citation_count",
    "source_db",
    "relation",
];

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Pretty-printed JSON array of works
pub fn write_json(path: &Path, works: &[CanonicalWork]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, works)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Wrote {} works to {}", works.len(), path.display());
    Ok(())
}

/// One row per work. List and object fields hold JSON text; absent values are empty cells.
pub fn write_csv(path: &Path, works: &[CanonicalWork]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;

    writer.write_record(CSV_COLUMNS)?;
    for work in works {
        writer.write_record(csv_row(work)?)?;
    }
    writer.flush()?;
    info!("Wrote {} works to {}", works.len(), path.display());
    Ok(())
}

fn opt_cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(work: &CanonicalWork) -> Result<[String; 14]> {
    let relation = match &work.relation {
        Some(map) => serde_json::to_string(map)?,
        None => String::new(),
    };
    Ok([
        opt_cell(&work.doi),
        opt_cell(&work.title),
        serde_json::to_string(&work.authors)?,
        opt_cell(&work.year),
        opt_cell(&work.publication_date),
        opt_cell(&work.journal_name),
        opt_cell(&work.publisher),
        opt_cell(&work.work_type),
        opt_cell(&work.abstract_text),
        serde_json::to_string(&work.subjects)?,
        opt_cell(&work.source_url),
        opt_cell(&work.citation_count),
        work.source_db.clone(),
        relation,
    ])
}

/// Persist works under `stem` (extension appended) in the requested format(s).
/// Returns the files written.
pub fn write_works(stem: &Path, format: OutputFormat, works: &[CanonicalWork]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if matches!(format, OutputFormat::Json | OutputFormat::Both) {
        let path = stem.with_extension("json");
        write_json(&path, works)?;
        written.push(path);
    }
    if matches!(format, OutputFormat::Csv | OutputFormat::Both) {
        let path = stem.with_extension("csv");
        write_csv(&path, works)?;
        written.push(path);
    }
    Ok(written)
}

/// Counts for one run, written next to the works as `<stem>.report.json`
#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub generated_at: DateTime<Utc>,
    pub search_term: &'a str,
    pub start_year: i32,
    pub end_year: i32,
    pub report: &'a RunReport,
}

impl<'a> RunManifest<'a> {
    pub fn new(search: &'a SearchConfig, report: &'a RunReport) -> Self {
        Self {
            generated_at: Utc::now(),
            search_term: &search.term,
            start_year: search.start_year,
            end_year: search.end_year,
            report,
        }
    }
}

pub fn write_manifest(stem: &Path, manifest: &RunManifest<'_>) -> Result<PathBuf> {
    let path = stem.with_extension("report.json");
    ensure_parent(&path)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writer.flush()?;
    Ok(path)
}

/// Save one source's raw records as a JSON array
pub fn write_raw_dump(path: &Path, records: &[RawWorkData]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Load a raw dump written by [`write_raw_dump`] (or any JSON array of records)
pub fn read_raw_dump(path: &Path) -> Result<Vec<RawWorkData>> {
    let reader = BufReader::new(File::open(path)?);
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    match value {
        serde_json::Value::Array(records) => Ok(records),
        _ => Err(HarvestError::Config(format!(
            "{} is not a JSON array of records",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Author, Source};

    fn sample() -> CanonicalWork {
        let mut work = CanonicalWork::empty(Source::Crossref);
        work.doi = Some("10.1/abc".to_string());
        work.title = Some("L'écriture du désastre".to_string());
        work.authors = vec![Author::from_full_name("Maurice Blanchot")];
        work.year = Some(1980);
        work.subjects = vec!["Philosophy".to_string()];
        work
    }

    #[test]
    fn test_csv_row_leaves_absent_values_empty() {
        let row = csv_row(&sample()).unwrap();
        assert_eq!(row[0], "10.1/abc");
        assert_eq!(row[3], "1980");
        assert_eq!(row[4], "");
        assert_eq!(row[11], "");
        assert_eq!(row[9], "[\"Philosophy\"]");
        assert!(row[2].contains("Maurice Blanchot"));
        assert_eq!(row[12], "Crossref");
        assert_eq!(row[13], "");
    }

    #[test]
    fn test_write_works_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("nested").join("data");
        let written = write_works(&stem, OutputFormat::Both, &[sample()]).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));

        let json: Vec<CanonicalWork> =
            serde_json::from_str(&fs::read_to_string(stem.with_extension("json")).unwrap()).unwrap();
        assert_eq!(json, vec![sample()]);

        let csv_text = fs::read_to_string(stem.with_extension("csv")).unwrap();
        assert!(csv_text.starts_with("doi,title,authors,year"));
        assert_eq!(csv_text.lines().count(), 2);
    }

    #[test]
    fn test_manifest_written_beside_works() {
        use crate::pipeline::processing::conflation::ReconcileStats;

        let dir = tempfile::tempdir().unwrap();
        let report = RunReport {
            sources: Vec::new(),
            reconcile: ReconcileStats::default(),
        };
        let search = SearchConfig::default();
        let path = write_manifest(&dir.path().join("data"), &RunManifest::new(&search, &report)).unwrap();

        assert!(path.ends_with("data.report.json"));
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["search_term"], "Blanchot");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_raw_dump_round_trip_and_rejects_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hal.json");
        let records = vec![serde_json::json!({"docid": 7})];
        write_raw_dump(&path, &records).unwrap();
        assert_eq!(read_raw_dump(&path).unwrap(), records);

        fs::write(&path, "{\"docid\": 7}").unwrap();
        assert!(matches!(read_raw_dump(&path), Err(HarvestError::Config(_))));
    }
}
