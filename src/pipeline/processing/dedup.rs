use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Source;
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::RawWorkData;

/// One uppercase letter followed by digits, e.g. `W2741809807`
static SHORT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]\d+").expect("short id pattern is valid"));

/// Why a natural key could not be read from a raw record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    #[error("missing key field '{field}'")]
    Missing { field: &'static str },

    #[error("no natural key in '{field}' value {value}")]
    Unparsable { field: &'static str, value: String },
}

/// A record dropped because its natural key could not be extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsableRecord {
    pub source: Source,
    pub identifier: Option<String>,
    pub reason: String,
}

/// Extracts a source's own natural key from a raw record
pub trait NaturalKey: Send + Sync {
    /// The raw field the key is read from
    fn field(&self) -> &'static str;

    fn extract(&self, raw: &RawWorkData) -> Result<String, KeyError>;
}

/// OpenAlex: short id pattern-matched out of the long-form `id` URL
pub struct OpenAlexShortId;

impl NaturalKey for OpenAlexShortId {
    fn field(&self) -> &'static str {
        "id"
    }

    fn extract(&self, raw: &RawWorkData) -> Result<String, KeyError> {
        let id = raw
            .get(self.field())
            .filter(|v| !v.is_null())
            .ok_or(KeyError::Missing { field: self.field() })?;
        let id = match id.as_str() {
            Some(s) => s.to_string(),
            None => id.to_string(),
        };
        SHORT_ID_RE
            .find(&id)
            .map(|m| m.as_str().to_string())
            .ok_or(KeyError::Unparsable {
                field: self.field(),
                value: id,
            })
    }
}

/// Crossref: the raw DOI, compared case-sensitively and without normalization
pub struct CrossrefDoi;

impl NaturalKey for CrossrefDoi {
    fn field(&self) -> &'static str {
        "DOI"
    }

    fn extract(&self, raw: &RawWorkData) -> Result<String, KeyError> {
        match raw.get(self.field()) {
            None | Some(serde_json::Value::Null) => Err(KeyError::Missing { field: self.field() }),
            Some(serde_json::Value::String(doi)) if doi.trim().is_empty() => {
                Err(KeyError::Missing { field: self.field() })
            }
            Some(serde_json::Value::String(doi)) => Ok(doi.clone()),
            Some(other) => Err(KeyError::Unparsable {
                field: self.field(),
                value: other.to_string(),
            }),
        }
    }
}

/// HAL: the numeric document id
pub struct HalDocId;

impl NaturalKey for HalDocId {
    fn field(&self) -> &'static str {
        "docid"
    }

    fn extract(&self, raw: &RawWorkData) -> Result<String, KeyError> {
        match raw.get(self.field()) {
            None | Some(serde_json::Value::Null) => Err(KeyError::Missing { field: self.field() }),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(other) => Err(KeyError::Unparsable {
                field: self.field(),
                value: other.to_string(),
            }),
        }
    }
}

/// Result of deduplicating one source's records
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// First occurrence of every key, in original order
    pub records: Vec<RawWorkData>,
    pub duplicates_removed: usize,
    pub unparsable: Vec<UnparsableRecord>,
}

/// Collapses raw records of one source sharing that source's natural key.
/// First seen wins; later duplicates are discarded without merging.
pub struct Deduplicator {
    source: Source,
    key: Box<dyn NaturalKey>,
}

impl Deduplicator {
    pub fn new(source: Source, key: Box<dyn NaturalKey>) -> Self {
        Self { source, key }
    }

    /// The built-in key extractor for `source`
    pub fn for_source(source: Source) -> Self {
        let key: Box<dyn NaturalKey> = match source {
            Source::OpenAlex => Box::new(OpenAlexShortId),
            Source::Crossref => Box::new(CrossrefDoi),
            Source::Hal => Box::new(HalDocId),
        };
        Self::new(source, key)
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn dedup(&self, raws: Vec<RawWorkData>) -> DedupOutcome {
        let original_count = raws.len();
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(raws.len());
        let mut unparsable = Vec::new();
        let mut duplicates_removed = 0usize;

        for raw in raws {
            match self.key.extract(&raw) {
                Ok(key) => {
                    if seen.insert(key.clone()) {
                        records.push(raw);
                    } else {
                        debug!("{}: dropping duplicate record with key {}", self.source, key);
                        duplicates_removed += 1;
                    }
                }
                Err(e) => {
                    let identifier = raw
                        .get(self.key.field())
                        .filter(|v| !v.is_null())
                        .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()));
                    warn!(
                        "{}: dropping record with unparsable key (identifier: {:?}): {}",
                        self.source, identifier, e
                    );
                    unparsable.push(UnparsableRecord {
                        source: self.source,
                        identifier,
                        reason: e.to_string(),
                    });
                }
            }
        }

        emit_source_counter(MetricName::DedupDuplicatesRemoved, self.source, duplicates_removed as u64);
        emit_source_counter(MetricName::DedupUnparsableKeys, self.source, unparsable.len() as u64);
        info!(
            "{}: deduplicated {} records to {} ({} duplicates, {} unparsable)",
            self.source,
            original_count,
            records.len(),
            duplicates_removed,
            unparsable.len()
        );

        DedupOutcome {
            records,
            duplicates_removed,
            unparsable,
        }
    }
}
