use std::collections::HashSet;
use tracing::debug;

use crate::domain::{Author, CanonicalWork, Source};
use crate::pipeline::processing::normalize::SourceNormalizer;
use crate::types::{int_field, str_field, RawWorkData};

/// Normalizer for OpenAlex `works` records
pub struct OpenAlexNormalizer;

impl OpenAlexNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn extract_authors(data: &RawWorkData) -> Vec<Author> {
        data.get("authorships")
            .and_then(|v| v.as_array())
            .map(|authorships| {
                authorships
                    .iter()
                    .filter_map(|a| a.get("author").filter(|author| author.is_object()))
                    .map(|author| {
                        let name = author
                            .get("display_name")
                            .and_then(|v| v.as_str())
                            .unwrap_or("");
                        Author::from_full_name(name)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concept display names; null concepts are skipped
    fn extract_subjects(data: &RawWorkData) -> Vec<String> {
        data.get("concepts")
            .and_then(|v| v.as_array())
            .map(|concepts| {
                concepts
                    .iter()
                    .filter(|c| !c.is_null())
                    .filter_map(|c| c.get("display_name").and_then(|v| v.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_journal(data: &RawWorkData) -> Option<String> {
        data.get("primary_location")
            .and_then(|loc| loc.get("source"))
            .and_then(|source| source.get("display_name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

impl Default for OpenAlexNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for OpenAlexNormalizer {
    fn normalize(&self, raw: &RawWorkData) -> CanonicalWork {
        CanonicalWork {
            doi: str_field(raw, "doi"),
            title: str_field(raw, "title"),
            authors: Self::extract_authors(raw),
            year: int_field(raw, "publication_year"),
            publication_date: str_field(raw, "publication_date"),
            journal_name: Self::extract_journal(raw),
            publisher: str_field(raw, "publisher"),
            work_type: str_field(raw, "type"),
            abstract_text: reconstruct_abstract(raw.get("abstract_inverted_index")),
            subjects: Self::extract_subjects(raw),
            source_url: str_field(raw, "id"),
            citation_count: int_field(raw, "cited_by_count"),
            source_db: Source::OpenAlex.label().to_string(),
            relation: None,
        }
    }

    fn source(&self) -> Source {
        Source::OpenAlex
    }

    fn name(&self) -> &str {
        "OpenAlex Works Normalizer"
    }
}

/// Rebuild plain text from an OpenAlex inverted index (word -> token positions).
///
/// Returns `None` for an absent or empty index, and for a malformed one: a
/// position that is not a non-negative integer, or two words claiming the
/// same position.
pub fn reconstruct_abstract(index: Option<&RawWorkData>) -> Option<String> {
    let index = index?.as_object()?;

    let mut word_positions: Vec<(u64, &str)> = Vec::new();
    let mut seen = HashSet::new();

    for (word, positions) in index {
        let Some(positions) = positions.as_array() else {
            debug!("Inverted index entry for '{}' is not a list; dropping abstract", word);
            return None;
        };
        for position in positions {
            let Some(pos) = position.as_u64() else {
                debug!("Inverted index position {} for '{}' is not an index; dropping abstract", position, word);
                return None;
            };
            if !seen.insert(pos) {
                debug!("Inverted index position {} is claimed twice; dropping abstract", pos);
                return None;
            }
            word_positions.push((pos, word.as_str()));
        }
    }

    if word_positions.is_empty() {
        return None;
    }

    word_positions.sort_by_key(|(pos, _)| *pos);
    let words: Vec<&str> = word_positions.into_iter().map(|(_, word)| word).collect();
    Some(words.join(" "))
}
