//! Canonical domain shapes shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{CROSSREF_LABEL, CROSSREF_SOURCE, HAL_LABEL, HAL_SOURCE, OPENALEX_LABEL, OPENALEX_SOURCE};

/// The external databases a work can be harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    OpenAlex,
    Crossref,
    Hal,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::OpenAlex, Source::Crossref, Source::Hal];

    /// Provenance label written to `CanonicalWork::source_db`
    pub fn label(&self) -> &'static str {
        match self {
            Source::OpenAlex => OPENALEX_LABEL,
            Source::Crossref => CROSSREF_LABEL,
            Source::Hal => HAL_LABEL,
        }
    }

    /// Lower-case name used on the command line and in config
    pub fn cli_name(&self) -> &'static str {
        match self {
            Source::OpenAlex => OPENALEX_SOURCE,
            Source::Crossref => CROSSREF_SOURCE,
            Source::Hal => HAL_SOURCE,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Source::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn from_cli_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Source::ALL.into_iter().find(|s| s.cli_name() == name)
    }

    /// Merge priority, lower is more trusted.
    /// The primary aggregator outranks the citation index, which outranks the repository.
    pub fn priority(&self) -> u8 {
        match self {
            Source::OpenAlex => 0,
            Source::Crossref => 1,
            Source::Hal => 2,
        }
    }

    /// Priority for an arbitrary `source_db` label; unknown labels rank last.
    pub fn priority_of_label(label: &str) -> u8 {
        Source::from_label(label)
            .map(|s| s.priority())
            .unwrap_or(u8::MAX)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub full_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl Author {
    pub fn from_full_name(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            given_name: None,
            family_name: None,
        }
    }
}

/// The unified representation of one work, whatever source it came from.
/// Absent optional fields serialize as `null`, never as `""` or `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalWork {
    pub doi: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub year: Option<i64>,
    pub publication_date: Option<String>,
    pub journal_name: Option<String>,
    pub publisher: Option<String>,
    pub work_type: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub subjects: Vec<String>,
    pub source_url: Option<String>,
    pub citation_count: Option<i64>,
    pub source_db: String,
    pub relation: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CanonicalWork {
    /// An empty record attributed to `source`
    pub fn empty(source: Source) -> Self {
        Self {
            doi: None,
            title: None,
            authors: Vec::new(),
            year: None,
            publication_date: None,
            journal_name: None,
            publisher: None,
            work_type: None,
            abstract_text: None,
            subjects: Vec::new(),
            source_url: None,
            citation_count: None,
            source_db: source.label().to_string(),
            relation: None,
        }
    }
}
