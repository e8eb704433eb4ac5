use crate::domain::{Author, CanonicalWork, Source};
use crate::pipeline::processing::normalize::SourceNormalizer;
use crate::types::{first_str_in_list, int_field, str_field, str_list, RawWorkData};

/// Normalizer for HAL search documents.
/// The harvested field list carries no DOI, so `doi` is always absent and HAL
/// records pass through reconciliation untouched.
pub struct HalNormalizer;

impl HalNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HalNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for HalNormalizer {
    fn normalize(&self, raw: &RawWorkData) -> CanonicalWork {
        CanonicalWork {
            doi: None,
            title: first_str_in_list(raw, "title_s"),
            authors: str_list(raw, "authFullName_s")
                .into_iter()
                .map(Author::from_full_name)
                .collect(),
            year: int_field(raw, "publicationDateY_i"),
            publication_date: str_field(raw, "publicationDate_s"),
            journal_name: str_field(raw, "journalTitle_s"),
            publisher: None,
            work_type: str_field(raw, "docType_s"),
            abstract_text: None,
            subjects: Vec::new(),
            source_url: str_field(raw, "uri_s"),
            citation_count: None,
            source_db: Source::Hal.label().to_string(),
            relation: None,
        }
    }

    fn source(&self) -> Source {
        Source::Hal
    }

    fn name(&self) -> &str {
        "HAL Documents Normalizer"
    }
}
