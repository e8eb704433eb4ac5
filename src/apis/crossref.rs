use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{build_http_client, build_url, get_json, on_page_failure, polite_delay, RawSchemaValidator};
use crate::config::{Config, HttpConfig, SearchConfig};
use crate::constants::CROSSREF_WORKS_URL;
use crate::domain::Source;
use crate::error::{HarvestError, Result};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::{RawWorkData, WorkSource};

const FIRST_CURSOR: &str = "*";

#[derive(Debug)]
pub struct CrossrefPage {
    pub items: Vec<RawWorkData>,
    pub next_cursor: Option<String>,
    pub total_results: Option<u64>,
}

/// Deep-paging client for `api.crossref.org/works`.
/// Crossref keeps handing out a cursor after the last page, so an empty page ends the walk.
pub struct CrossrefClient {
    client: reqwest::Client,
    search: SearchConfig,
    http: HttpConfig,
    validator: RawSchemaValidator,
}

impl CrossrefClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            search: config.search.clone(),
            http: config.http.clone(),
            validator: RawSchemaValidator::for_source(Source::Crossref)?,
        })
    }

    pub fn page_url(&self, cursor: &str) -> Result<reqwest::Url> {
        let mut params = vec![
            ("query.bibliographic", self.search.term.clone()),
            ("filter", format!("from-pub-date:{}", self.search.start_year)),
            ("sort", "published".to_string()),
            ("order", "asc".to_string()),
            ("rows", self.http.crossref_rows.to_string()),
            ("cursor", cursor.to_string()),
        ];
        if let Some(mailto) = &self.http.mailto {
            params.push(("mailto", mailto.clone()));
        }
        build_url(CROSSREF_WORKS_URL, &params)
    }

    pub fn parse_page(body: &Value) -> Result<CrossrefPage> {
        let message = body.get("message").ok_or_else(|| HarvestError::Api {
            message: "Crossref response has no 'message' object".to_string(),
        })?;
        let items = message
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();
        let next_cursor = message
            .get("next-cursor")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string());
        let total_results = message.get("total-results").and_then(|t| t.as_u64());

        Ok(CrossrefPage {
            items,
            next_cursor,
            total_results,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<CrossrefPage> {
        let body = get_json(&self.client, self.page_url(cursor)?).await?;
        Self::parse_page(&body)
    }
}

#[async_trait::async_trait]
impl WorkSource for CrossrefClient {
    fn source(&self) -> Source {
        Source::Crossref
    }

    #[instrument(skip(self), fields(source = "crossref"))]
    async fn fetch_works(&self) -> Result<Vec<RawWorkData>> {
        let mut records = Vec::new();
        let mut cursor = FIRST_CURSOR.to_string();
        let mut pages = 0usize;
        let mut invalid = 0usize;

        loop {
            let page = match self.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(e) => return on_page_failure(Source::Crossref, pages, records, e),
            };
            if pages == 0 {
                if let Some(total) = page.total_results {
                    info!("Crossref reports {} matching works", total);
                }
            }
            pages += 1;
            emit_source_counter(MetricName::HarvestPagesFetched, Source::Crossref, 1);

            if page.items.is_empty() {
                break;
            }

            let (valid, rejected) = self.validator.retain_valid(page.items);
            debug!("Crossref page {}: {} valid, {} invalid", pages, valid.len(), rejected.len());
            invalid += rejected.len();
            records.extend(valid);

            match page.next_cursor {
                Some(next) => cursor = next,
                None => break,
            }
            polite_delay(self.http.request_delay_ms).await;
        }

        emit_source_counter(MetricName::HarvestRecordsFetched, Source::Crossref, records.len() as u64);
        info!("Crossref: downloaded {} valid works ({} invalid)", records.len(), invalid);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_url_sorts_by_publication() {
        let mut config = Config::default();
        config.http.mailto = Some("someone@example.org".to_string());
        let client = CrossrefClient::new(&config).unwrap();
        let url = client.page_url("AoJ8").unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(query.contains(&("query.bibliographic".to_string(), "Blanchot".to_string())));
        assert!(query.contains(&("filter".to_string(), "from-pub-date:1998".to_string())));
        assert!(query.contains(&("sort".to_string(), "published".to_string())));
        assert!(query.contains(&("cursor".to_string(), "AoJ8".to_string())));
        assert!(query.contains(&("mailto".to_string(), "someone@example.org".to_string())));
    }

    #[test]
    fn test_parse_page_reads_hyphenated_cursor() {
        let body = json!({
            "status": "ok",
            "message": {
                "total-results": 1,
                "next-cursor": "DnF1",
                "items": [{"DOI": "10.1/a"}]
            }
        });
        let page = CrossrefClient::parse_page(&body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("DnF1"));
        assert_eq!(page.total_results, Some(1));
    }

    #[test]
    fn test_parse_page_missing_items_is_empty() {
        let page = CrossrefClient::parse_page(&json!({"message": {"next-cursor": "x"}})).unwrap();
        assert!(page.items.is_empty());
        assert!(CrossrefClient::parse_page(&json!({"status": "failed"})).is_err());
    }
}
