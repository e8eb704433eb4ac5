//! HTTP clients for the harvested databases.
//!
//! Each client pages through its API, validates every raw record against the
//! source schema and hands back the valid ones. Reconciliation never sees a
//! live connection.

pub mod crossref;
pub mod hal;
pub mod openalex;
pub mod schema;

pub use crossref::CrossrefClient;
pub use hal::HalClient;
pub use openalex::OpenAlexClient;
pub use schema::{InvalidRecord, RawSchemaValidator};

use std::time::Duration;
use tracing::error;

use crate::config::Config;
use crate::domain::Source;
use crate::error::{HarvestError, Result};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::{RawWorkData, WorkSource};

const USER_AGENT: &str = concat!("biblio_harvester/", env!("CARGO_PKG_VERSION"));

/// Build the client for `source` from configuration
pub fn create_source(source: Source, config: &Config) -> Result<Box<dyn WorkSource>> {
    Ok(match source {
        Source::OpenAlex => Box::new(OpenAlexClient::new(config)?),
        Source::Crossref => Box::new(CrossrefClient::new(config)?),
        Source::Hal => Box::new(HalClient::new(config)?),
    })
}

pub(crate) fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

pub(crate) fn build_url(base: &str, params: &[(&str, String)]) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params)
        .map_err(|e| HarvestError::Config(format!("Invalid request URL for {}: {}", base, e)))
}

pub(crate) async fn get_json(client: &reqwest::Client, url: reqwest::Url) -> Result<serde_json::Value> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json().await?)
}

pub(crate) async fn polite_delay(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// A page failed. Before any page succeeded this fails the source; afterwards
/// the records collected so far are returned as a truncated result.
pub(crate) fn on_page_failure(
    source: Source,
    pages_fetched: usize,
    records: Vec<RawWorkData>,
    err: HarvestError,
) -> Result<Vec<RawWorkData>> {
    emit_source_counter(MetricName::HarvestRequestErrors, source, 1);
    if pages_fetched == 0 {
        return Err(err);
    }
    error!(
        "{}: request failed after {} pages, keeping {} records: {}",
        source,
        pages_fetched,
        records.len(),
        err
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "https://api.example.org/works",
            &[("q", "(title_t:\"Blanchot\")".to_string()), ("rows", "0".to_string())],
        )
        .unwrap();
        assert_eq!(url.query(), Some("q=%28title_t%3A%22Blanchot%22%29&rows=0"));
    }

    #[test]
    fn test_page_failure_before_first_page_is_error() {
        let err = HarvestError::Api { message: "boom".to_string() };
        assert!(on_page_failure(Source::Hal, 0, vec![], err).is_err());

        let err = HarvestError::Api { message: "boom".to_string() };
        let kept = on_page_failure(Source::Hal, 2, vec![serde_json::json!({"docid": 1})], err).unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_create_every_source() {
        let config = Config::default();
        for source in Source::ALL {
            let client = create_source(source, &config).unwrap();
            assert_eq!(client.source(), source);
        }
    }
}
