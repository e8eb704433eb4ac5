use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{build_http_client, build_url, get_json, on_page_failure, polite_delay, RawSchemaValidator};
use crate::config::{Config, HttpConfig, SearchConfig};
use crate::constants::OPENALEX_WORKS_URL;
use crate::domain::Source;
use crate::error::{HarvestError, Result};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::{RawWorkData, WorkSource};

const FIRST_CURSOR: &str = "*";

/// One page of `/works` results
#[derive(Debug)]
pub struct OpenAlexPage {
    pub results: Vec<RawWorkData>,
    pub next_cursor: Option<String>,
    pub total_count: Option<u64>,
}

/// Cursor-paginated client for `api.openalex.org/works`
pub struct OpenAlexClient {
    client: reqwest::Client,
    search: SearchConfig,
    http: HttpConfig,
    validator: RawSchemaValidator,
}

impl OpenAlexClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            search: config.search.clone(),
            http: config.http.clone(),
            validator: RawSchemaValidator::for_source(Source::OpenAlex)?,
        })
    }

    pub fn filter_expression(&self) -> String {
        format!(
            "title_and_abstract.search:{},publication_year:{}-{}",
            self.search.term, self.search.start_year, self.search.end_year
        )
    }

    pub fn page_url(&self, cursor: &str) -> Result<reqwest::Url> {
        let mut params = vec![
            ("filter", self.filter_expression()),
            ("per_page", self.http.openalex_per_page.to_string()),
            ("cursor", cursor.to_string()),
        ];
        if let Some(mailto) = &self.http.mailto {
            params.push(("mailto", mailto.clone()));
        }
        build_url(OPENALEX_WORKS_URL, &params)
    }

    pub fn parse_page(body: &Value) -> Result<OpenAlexPage> {
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .ok_or_else(|| HarvestError::Api {
                message: "OpenAlex response has no 'results' array".to_string(),
            })?;
        let meta = body.get("meta");
        let next_cursor = meta
            .and_then(|m| m.get("next_cursor"))
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string());
        let total_count = meta.and_then(|m| m.get("count")).and_then(|c| c.as_u64());

        Ok(OpenAlexPage {
            results,
            next_cursor,
            total_count,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<OpenAlexPage> {
        let body = get_json(&self.client, self.page_url(cursor)?).await?;
        Self::parse_page(&body)
    }
}

#[async_trait::async_trait]
impl WorkSource for OpenAlexClient {
    fn source(&self) -> Source {
        Source::OpenAlex
    }

    #[instrument(skip(self), fields(source = "openalex"))]
    async fn fetch_works(&self) -> Result<Vec<RawWorkData>> {
        let mut records = Vec::new();
        let mut cursor = FIRST_CURSOR.to_string();
        let mut pages = 0usize;
        let mut invalid = 0usize;

        loop {
            let page = match self.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(e) => return on_page_failure(Source::OpenAlex, pages, records, e),
            };
            if pages == 0 {
                if let Some(total) = page.total_count {
                    info!("OpenAlex reports {} matching works", total);
                }
            }
            pages += 1;
            emit_source_counter(MetricName::HarvestPagesFetched, Source::OpenAlex, 1);

            let (valid, rejected) = self.validator.retain_valid(page.results);
            debug!("OpenAlex page {}: {} valid, {} invalid", pages, valid.len(), rejected.len());
            invalid += rejected.len();
            records.extend(valid);

            match page.next_cursor {
                Some(next) => cursor = next,
                None => break,
            }
            polite_delay(self.http.request_delay_ms).await;
        }

        emit_source_counter(MetricName::HarvestRecordsFetched, Source::OpenAlex, records.len() as u64);
        info!("OpenAlex: downloaded {} valid works ({} invalid)", records.len(), invalid);
        Ok(records)
    }
}
