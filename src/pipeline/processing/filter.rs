use tracing::info;

use crate::constants::DEFAULT_PUBLISHER_KEYWORDS;
use crate::domain::Source;
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::RawWorkData;

/// Keeps Crossref records whose publisher looks academic.
///
/// A record passes when its `publisher` contains any keyword, compared
/// case-insensitively. Records without a publisher are removed. An empty
/// keyword list keeps everything.
#[derive(Debug, Clone)]
pub struct PublisherFilter {
    keywords: Vec<String>,
}

impl PublisherFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.keywords.is_empty()
    }

    pub fn accepts(&self, raw: &RawWorkData) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let Some(publisher) = raw.get("publisher").and_then(|v| v.as_str()) else {
            return false;
        };
        let publisher = publisher.to_lowercase();
        self.keywords.iter().any(|k| publisher.contains(k.as_str()))
    }

    /// Filter a batch, returning the kept records and how many were removed
    pub fn apply(&self, raws: Vec<RawWorkData>) -> (Vec<RawWorkData>, usize) {
        let before = raws.len();
        let kept: Vec<RawWorkData> = raws.into_iter().filter(|r| self.accepts(r)).collect();
        let removed = before - kept.len();

        emit_source_counter(MetricName::FilterRecordsRemoved, Source::Crossref, removed as u64);
        info!("Publisher filter kept {} of {} Crossref records", kept.len(), before);
        (kept, removed)
    }
}

impl Default for PublisherFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISHER_KEYWORDS.iter())
    }
}
