use crate::domain::Source;
use crate::error::Result;

/// Raw work data as returned from an external API.
/// Read field by field by the matching adapter; never mutated.
pub type RawWorkData = serde_json::Value;

/// Core trait that every harvested bibliographic source must implement
#[async_trait::async_trait]
pub trait WorkSource: Send + Sync {
    /// Which database this client talks to
    fn source(&self) -> Source;

    /// Fetch every schema-valid raw work for the configured search.
    /// A failure part-way through pagination returns what was collected.
    async fn fetch_works(&self) -> Result<Vec<RawWorkData>>;
}

/// Small accessors for reading raw JSON defensively
pub(crate) fn str_field(data: &RawWorkData, key: &str) -> Option<String> {
    data.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

pub(crate) fn int_field(data: &RawWorkData, key: &str) -> Option<i64> {
    data.get(key).and_then(|v| v.as_i64())
}

/// First string of a list field such as Crossref `title` or HAL `title_s`
pub(crate) fn first_str_in_list(data: &RawWorkData, key: &str) -> Option<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Every string in a list field, skipping non-string entries
pub(crate) fn str_list(data: &RawWorkData, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}
