use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::Source;
use crate::error::{HarvestError, Result};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::RawWorkData;

const OPENALEX_SCHEMA: &str = include_str!("../../schemas/openalex.work.v1.json");
const CROSSREF_SCHEMA: &str = include_str!("../../schemas/crossref.work.v1.json");
const HAL_SCHEMA: &str = include_str!("../../schemas/hal.work.v1.json");

/// A raw record rejected by its source schema
#[derive(Debug, Clone, Serialize)]
pub struct InvalidRecord {
    pub source: Source,
    pub identifier: Option<String>,
    pub errors: Vec<String>,
}

/// Validates raw API records against the shape the adapters expect.
/// Extra fields are always allowed.
pub struct RawSchemaValidator {
    source: Source,
    compiled: JSONSchema,
}

impl RawSchemaValidator {
    pub fn for_source(source: Source) -> Result<Self> {
        let schema_text = match source {
            Source::OpenAlex => OPENALEX_SCHEMA,
            Source::Crossref => CROSSREF_SCHEMA,
            Source::Hal => HAL_SCHEMA,
        };
        let schema_json: Value = serde_json::from_str(schema_text)?;

        // jsonschema 0.17 ties compile errors to the schema lifetime; the schema lives for the process anyway
        let schema_static: &'static Value = Box::leak(Box::new(schema_json));
        let compiled = JSONSchema::options()
            .compile(schema_static)
            .map_err(|e| HarvestError::Schema(format!("{} schema failed to compile: {}", source, e)))?;

        Ok(Self { source, compiled })
    }

    /// Field that identifies a record in failure logs
    fn identifier_field(&self) -> &'static str {
        match self.source {
            Source::OpenAlex => "id",
            Source::Crossref => "DOI",
            Source::Hal => "uri_s",
        }
    }

    pub fn validate(&self, raw: &RawWorkData) -> std::result::Result<(), Vec<String>> {
        self.compiled.validate(raw).map_err(|errors| {
            errors
                .map(|error| format!("{} at {}", error, error.instance_path))
                .collect()
        })
    }

    /// Split a page into valid records and logged rejects
    pub fn retain_valid(&self, raws: Vec<RawWorkData>) -> (Vec<RawWorkData>, Vec<InvalidRecord>) {
        let mut valid = Vec::with_capacity(raws.len());
        let mut invalid = Vec::new();

        for raw in raws {
            match self.validate(&raw) {
                Ok(()) => valid.push(raw),
                Err(errors) => {
                    let identifier = raw
                        .get(self.identifier_field())
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    warn!(
                        "{}: skipping invalid record {:?}: {}",
                        self.source,
                        identifier,
                        errors.join("; ")
                    );
                    invalid.push(InvalidRecord {
                        source: self.source,
                        identifier,
                        errors,
                    });
                }
            }
        }

        if !invalid.is_empty() {
            emit_source_counter(MetricName::HarvestRecordsInvalid, self.source, invalid.len() as u64);
        }
        (valid, invalid)
    }
}
