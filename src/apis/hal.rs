use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{build_http_client, build_url, get_json, on_page_failure, polite_delay, RawSchemaValidator};
use crate::config::{Config, HttpConfig, SearchConfig};
use crate::constants::{HAL_FIELD_LIST, HAL_SEARCH_URL};
use crate::domain::Source;
use crate::error::{HarvestError, Result};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::{RawWorkData, WorkSource};

/// Offset-paginated client for the HAL Solr search endpoint.
/// A `rows=0` probe reads `numFound` first, then pages are walked by `start`.
pub struct HalClient {
    client: reqwest::Client,
    search: SearchConfig,
    http: HttpConfig,
    validator: RawSchemaValidator,
}

impl HalClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            search: config.search.clone(),
            http: config.http.clone(),
            validator: RawSchemaValidator::for_source(Source::Hal)?,
        })
    }

    pub fn query(&self) -> String {
        format!("(title_t:\"{0}\" OR abstract_t:\"{0}\")", self.search.term)
    }

    pub fn year_filter(&self) -> String {
        format!("publicationDateY_i:[{} TO *]", self.search.start_year)
    }

    pub fn count_url(&self) -> Result<reqwest::Url> {
        build_url(
            HAL_SEARCH_URL,
            &[
                ("q", self.query()),
                ("fq", self.year_filter()),
                ("rows", "0".to_string()),
                ("wt", "json".to_string()),
            ],
        )
    }

    pub fn page_url(&self, start: u64) -> Result<reqwest::Url> {
        build_url(
            HAL_SEARCH_URL,
            &[
                ("q", self.query()),
                ("fq", self.year_filter()),
                ("fl", HAL_FIELD_LIST.to_string()),
                ("wt", "json".to_string()),
                ("rows", self.http.hal_rows.to_string()),
                ("start", start.to_string()),
                ("sort", "docid asc".to_string()),
            ],
        )
    }

    fn response_body(body: &Value) -> Result<&Value> {
        body.get("response").ok_or_else(|| HarvestError::Api {
            message: "HAL response has no 'response' object".to_string(),
        })
    }

    pub fn parse_count(body: &Value) -> Result<u64> {
        Self::response_body(body)?
            .get("numFound")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| HarvestError::Api {
                message: "HAL response has no 'numFound'".to_string(),
            })
    }

    pub fn parse_docs(body: &Value) -> Result<Vec<RawWorkData>> {
        Ok(Self::response_body(body)?
            .get("docs")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_count(&self) -> Result<u64> {
        let body = get_json(&self.client, self.count_url()?).await?;
        Self::parse_count(&body)
    }

    async fn fetch_page(&self, start: u64) -> Result<Vec<RawWorkData>> {
        let body = get_json(&self.client, self.page_url(start)?).await?;
        Self::parse_docs(&body)
    }
}

#[async_trait::async_trait]
impl WorkSource for HalClient {
    fn source(&self) -> Source {
        Source::Hal
    }

    #[instrument(skip(self), fields(source = "hal"))]
    async fn fetch_works(&self) -> Result<Vec<RawWorkData>> {
        let total = match self.fetch_count().await {
            Ok(total) => total,
            Err(e) => return on_page_failure(Source::Hal, 0, Vec::new(), e),
        };
        info!("HAL reports {} matching documents", total);

        let mut records = Vec::new();
        let mut start = 0u64;
        let mut pages = 0usize;
        let mut invalid = 0usize;

        while start < total {
            // the count probe already succeeded, so a page failure keeps what we have
            let docs = match self.fetch_page(start).await {
                Ok(docs) => docs,
                Err(e) => return on_page_failure(Source::Hal, pages + 1, records, e),
            };
            pages += 1;
            emit_source_counter(MetricName::HarvestPagesFetched, Source::Hal, 1);

            if docs.is_empty() {
                break;
            }
            start += docs.len() as u64;

            let (valid, rejected) = self.validator.retain_valid(docs);
            debug!("HAL page {}: {} valid, {} invalid", pages, valid.len(), rejected.len());
            invalid += rejected.len();
            records.extend(valid);

            polite_delay(self.http.request_delay_ms).await;
        }

        emit_source_counter(MetricName::HarvestRecordsFetched, Source::Hal, records.len() as u64);
        info!("HAL: downloaded {} valid documents ({} invalid)", records.len(), invalid);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_searches_title_and_abstract() {
        let client = HalClient::new(&Config::default()).unwrap();
        assert_eq!(client.query(), "(title_t:\"Blanchot\" OR abstract_t:\"Blanchot\")");
        assert_eq!(client.year_filter(), "publicationDateY_i:[1998 TO *]");
    }

    #[test]
    fn test_page_url_requests_field_list() {
        let client = HalClient::new(&Config::default()).unwrap();
        let url = client.page_url(200).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(query.contains(&("fl".to_string(), HAL_FIELD_LIST.to_string())));
        assert!(query.contains(&("start".to_string(), "200".to_string())));
        assert!(query.contains(&("rows".to_string(), "100".to_string())));
        assert!(query.contains(&("sort".to_string(), "docid asc".to_string())));

        let count: Vec<(String, String)> = client.count_url().unwrap().query_pairs().into_owned().collect();
        assert!(count.contains(&("rows".to_string(), "0".to_string())));
    }

    #[test]
    fn test_parse_count_and_docs() {
        let body = json!({"response": {"numFound": 3, "start": 0, "docs": [{"docid": 1}, {"docid": 2}]}});
        assert_eq!(HalClient::parse_count(&body).unwrap(), 3);
        assert_eq!(HalClient::parse_docs(&body).unwrap().len(), 2);

        assert!(HalClient::parse_count(&json!({"error": {"msg": "bad"}})).is_err());
    }
}
