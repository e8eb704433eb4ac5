use tracing::debug;

use crate::constants::DOI_RESOLVER_PREFIX;
use crate::domain::{Author, CanonicalWork, Source};
use crate::pipeline::processing::normalize::SourceNormalizer;
use crate::types::{first_str_in_list, int_field, str_field, str_list, RawWorkData};

/// Normalizer for Crossref `works` items
pub struct CrossrefNormalizer;

impl CrossrefNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn extract_authors(data: &RawWorkData) -> Vec<Author> {
        data.get("author")
            .and_then(|v| v.as_array())
            .map(|authors| {
                authors
                    .iter()
                    .map(|author| {
                        let given = author.get("given").and_then(|v| v.as_str()).unwrap_or("");
                        let family = author.get("family").and_then(|v| v.as_str()).unwrap_or("");
                        Author {
                            full_name: format!("{} {}", given, family).trim().to_string(),
                            given_name: Some(given.to_string()),
                            family_name: Some(family.to_string()),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Year from the first non-empty date block, print before online
    fn extract_year(data: &RawWorkData) -> Option<i64> {
        let published = ["published-print", "published-online"]
            .iter()
            .filter_map(|key| data.get(*key))
            .find(|block| block.as_object().is_some_and(|o| !o.is_empty()))?;

        published
            .get("date-parts")
            .and_then(|v| v.as_array())
            .and_then(|parts| parts.first())
            .and_then(|first| first.as_array())
            .and_then(|first| first.first())
            .and_then(|year| year.as_i64())
    }

    fn extract_relation(data: &RawWorkData) -> Option<serde_json::Map<String, serde_json::Value>> {
        match data.get("relation") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                debug!("Ignoring Crossref relation of unexpected shape: {}", other);
                None
            }
        }
    }
}

impl Default for CrossrefNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for CrossrefNormalizer {
    fn normalize(&self, raw: &RawWorkData) -> CanonicalWork {
        let doi = str_field(raw, "DOI");
        let source_url = str_field(raw, "URL")
            .filter(|url| !url.is_empty())
            .or_else(|| {
                doi.as_ref()
                    .filter(|doi| !doi.is_empty())
                    .map(|doi| format!("{}{}", DOI_RESOLVER_PREFIX, doi))
            });

        CanonicalWork {
            title: first_str_in_list(raw, "title"),
            authors: Self::extract_authors(raw),
            year: Self::extract_year(raw),
            publication_date: None,
            journal_name: first_str_in_list(raw, "container-title"),
            publisher: str_field(raw, "publisher"),
            work_type: str_field(raw, "type"),
            abstract_text: None,
            subjects: str_list(raw, "subject"),
            source_url,
            citation_count: int_field(raw, "is-referenced-by-count"),
            source_db: Source::Crossref.label().to_string(),
            relation: Self::extract_relation(raw),
            doi,
        }
    }

    fn source(&self) -> Source {
        Source::Crossref
    }

    fn name(&self) -> &str {
        "Crossref Works Normalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_record() {
        let raw = json!({
            "DOI": "10.1000/xyz123",
            "title": ["L'Entretien infini", "Subtitle"],
            "author": [
                {"given": "Maurice", "family": "Blanchot", "sequence": "first"},
                {"family": "Derrida"}
            ],
            "publisher": "Presses Universitaires de France",
            "type": "journal-article",
            "published-print": {"date-parts": [[1969, 5, 1]]},
            "container-title": ["Revue de Métaphysique"],
            "subject": ["Philosophy"],
            "is-referenced-by-count": 7,
            "URL": "http://dx.doi.org/10.1000/xyz123",
            "relation": {"is-retracted-by": [{"id": "10.1000/r1", "id-type": "doi"}]}
        });

        let work = CrossrefNormalizer::new().normalize(&raw);

        assert_eq!(work.doi.as_deref(), Some("10.1000/xyz123"));
        assert_eq!(work.title.as_deref(), Some("L'Entretien infini"));
        assert_eq!(work.year, Some(1969));
        assert_eq!(work.journal_name.as_deref(), Some("Revue de Métaphysique"));
        assert_eq!(work.authors[0].full_name, "Maurice Blanchot");
        assert_eq!(work.authors[1].full_name, "Derrida");
        assert_eq!(work.authors[1].given_name.as_deref(), Some(""));
        assert_eq!(work.source_url.as_deref(), Some("http://dx.doi.org/10.1000/xyz123"));
        assert_eq!(work.citation_count, Some(7));
        assert!(work.relation.is_some());
        assert!(work.publication_date.is_none());
        assert_eq!(work.source_db, "Crossref");
    }

    #[test]
    fn test_year_falls_back_to_online_block() {
        let raw = json!({"DOI": "10.1/a", "published-online": {"date-parts": [[2004]]}});
        assert_eq!(CrossrefNormalizer::new().normalize(&raw).year, Some(2004));

        let raw = json!({
            "DOI": "10.1/a",
            "published-print": {},
            "published-online": {"date-parts": [[2005, 2]]}
        });
        assert_eq!(CrossrefNormalizer::new().normalize(&raw).year, Some(2005));
    }

    #[test]
    fn test_year_absent_for_empty_date_parts() {
        let raw = json!({"DOI": "10.1/a", "published-print": {"date-parts": [[]]}});
        assert_eq!(CrossrefNormalizer::new().normalize(&raw).year, None);

        let raw = json!({"DOI": "10.1/a", "published-print": {"date-parts": [[null]]}});
        assert_eq!(CrossrefNormalizer::new().normalize(&raw).year, None);
    }

    #[test]
    fn test_source_url_synthesized_from_doi() {
        let raw = json!({"DOI": "10.1/abc", "title": []});
        let work = CrossrefNormalizer::new().normalize(&raw);
        assert_eq!(work.source_url.as_deref(), Some("https://doi.org/10.1/abc"));
        assert!(work.title.is_none());

        let work = CrossrefNormalizer::new().normalize(&json!({}));
        assert!(work.source_url.is_none());
        assert!(work.doi.is_none());
    }

    #[test]
    fn test_empty_doi_does_not_synthesize_url() {
        let work = CrossrefNormalizer::new().normalize(&json!({"DOI": "", "title": ["T"]}));
        assert!(work.source_url.is_none());
        assert_eq!(work.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_malformed_relation_is_dropped() {
        let raw = json!({"DOI": "10.1/abc", "relation": ["not", "a", "map"]});
        assert!(CrossrefNormalizer::new().normalize(&raw).relation.is_none());
    }

    #[test]
    fn test_container_title_must_be_non_empty_list() {
        let raw = json!({"DOI": "10.1/abc", "container-title": []});
        assert!(CrossrefNormalizer::new().normalize(&raw).journal_name.is_none());

        let raw = json!({"DOI": "10.1/abc", "container-title": "Not a list"});
        assert!(CrossrefNormalizer::new().normalize(&raw).journal_name.is_none());
    }
}
