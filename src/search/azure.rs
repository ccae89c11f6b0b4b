//! Azure AI Search REST client.
//!
//! Talks to a single index through the `docs/search`, `docs/index` and
//! `docs/$count` endpoints using an admin `api-key`.

use super::{
    AnalyticsSummary, FacetBucket, IndexDocument, SearchHit, SearchIndex, SearchQuery,
    SearchResults,
};
use crate::config::SearchSettings;
use crate::error::{QnaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum documents per indexing request accepted by the service.
const MAX_BATCH: usize = 1000;

/// Consecutive pages of already-deleted keys tolerated while the index catches up.
const MAX_STALE_PAGES: usize = 5;

/// Azure AI Search index client.
pub struct AzureSearchIndex {
    client: reqwest::Client,
    base: Url,
    api_version: String,
    api_key: String,
    key_field: String,
}

#[derive(Serialize)]
struct SearchRequestBody {
    search: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    top: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<String>,
    count: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponseBody {
    #[serde(rename = "@odata.count")]
    count: Option<u64>,
    #[serde(rename = "@search.facets", default)]
    facets: Option<BTreeMap<String, Vec<FacetBucket>>>,
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
struct IndexResponseBody {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

impl AzureSearchIndex {
    /// Create a client for one index.
    pub fn new(
        endpoint: &str,
        index_name: &str,
        api_version: &str,
        api_key: &str,
        key_field: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(QnaError::Config(
                "search.endpoint is not set. Add it to the config file.".to_string(),
            ));
        }

        let base = Url::parse(&format!(
            "{}/indexes/{}/",
            endpoint.trim_end_matches('/'),
            index_name
        ))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            api_version: api_version.to_string(),
            api_key: api_key.to_string(),
            key_field: key_field.to_string(),
        })
    }

    /// Create a client from the `[search]` settings section.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            QnaError::Config(format!(
                "No search API key. Set search.api_key or export {}.",
                crate::config::SEARCH_API_KEY_ENV
            ))
        })?;

        Self::new(
            &settings.endpoint,
            &settings.index_name,
            &settings.api_version,
            &api_key,
            &settings.key_field,
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    fn url(&self, path: &str) -> Result<Url> {
        let mut url = self.base.join(path)?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.url(path)?)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        check_status(path, response).await
    }

    async fn search_raw(&self, body: &SearchRequestBody) -> Result<SearchResponseBody> {
        let response = self.post("docs/search", body).await?;
        Ok(response.json().await?)
    }

    async fn index_batch(&self, actions: Vec<Value>) -> Result<usize> {
        let total = actions.len();
        let body = serde_json::json!({ "value": actions });
        let response = self.post("docs/index", &body).await?;
        let result: IndexResponseBody = response.json().await?;

        let failed: Vec<&IndexingResult> = result.value.iter().filter(|r| !r.status).collect();
        if let Some(first) = failed.first() {
            return Err(QnaError::Search(format!(
                "{} of {} documents rejected (first: {}: {})",
                failed.len(),
                total,
                first.key,
                first.error_message.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(total)
    }

    /// Fetch one page of document keys.
    async fn key_page(&self) -> Result<Vec<String>> {
        let body = SearchRequestBody {
            search: "*".to_string(),
            filter: None,
            top: MAX_BATCH,
            facets: Vec::new(),
            count: false,
            select: Some(self.key_field.clone()),
        };

        let response = self.search_raw(&body).await?;
        Ok(response
            .value
            .iter()
            .filter_map(|doc| doc.get(&self.key_field))
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect())
    }

    fn to_hit(&self, mut fields: Map<String, Value>) -> SearchHit {
        if let Some(score) = fields.remove("@search.score") {
            fields.insert("score".to_string(), score);
        }
        if let Some(score) = fields.remove("@search.rerankerScore") {
            fields.insert("reranker_score".to_string(), score);
        }
        fields.retain(|k, _| !k.starts_with("@search."));

        if !fields.contains_key("doc_id") {
            if let Some(key) = fields.get(&self.key_field).cloned() {
                fields.insert("doc_id".to_string(), key);
            }
        }

        SearchHit::new(fields)
    }
}

async fn check_status(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(QnaError::Search(format!(
        "{} returned {}: {}",
        operation, status, body
    )))
}

#[async_trait]
impl SearchIndex for AzureSearchIndex {
    #[instrument(skip(self, query), fields(text = %query.text, top = query.top))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let body = SearchRequestBody {
            search: if query.text.trim().is_empty() {
                "*".to_string()
            } else {
                query.text.clone()
            },
            filter: query.filter.clone(),
            top: query.top,
            facets: query.facets.clone(),
            count: query.include_count,
            select: None,
        };

        let response = self.search_raw(&body).await?;

        let analytics = if query.wants_analytics() {
            Some(AnalyticsSummary {
                count: response.count,
                facets: response.facets.unwrap_or_default(),
            })
        } else {
            None
        };

        let hits: Vec<SearchHit> = response
            .value
            .into_iter()
            .map(|fields| self.to_hit(fields))
            .collect();

        debug!("Search returned {} hits", hits.len());

        Ok(SearchResults { hits, analytics })
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn upload(&self, documents: &[IndexDocument]) -> Result<usize> {
        let mut uploaded = 0;

        for chunk in documents.chunks(MAX_BATCH) {
            let actions: Vec<Value> = chunk
                .iter()
                .map(|doc| {
                    let mut action = doc.clone();
                    action.insert(
                        "@search.action".to_string(),
                        Value::String("mergeOrUpload".to_string()),
                    );
                    Value::Object(action)
                })
                .collect();

            uploaded += self.index_batch(actions).await?;
        }

        Ok(uploaded)
    }

    #[instrument(skip(self))]
    async fn clear_index(&self) -> Result<usize> {
        let mut deleted: HashSet<String> = HashSet::new();
        let mut stale_pages = 0;

        loop {
            let keys = self.key_page().await?;
            if keys.is_empty() {
                break;
            }

            let fresh: Vec<String> = keys.into_iter().filter(|k| !deleted.contains(k)).collect();

            if fresh.is_empty() {
                // Deletions are not yet visible to search
                stale_pages += 1;
                if stale_pages > MAX_STALE_PAGES {
                    warn!("Index still reports deleted keys, stopping clear");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }
            stale_pages = 0;

            let actions: Vec<Value> = fresh
                .iter()
                .map(|key| {
                    let mut action = Map::new();
                    action.insert("@search.action".to_string(), Value::String("delete".to_string()));
                    action.insert(self.key_field.clone(), Value::String(key.clone()));
                    Value::Object(action)
                })
                .collect();

            self.index_batch(actions).await?;
            debug!("Deleted {} documents", fresh.len());
            deleted.extend(fresh);
        }

        info!("Cleared {} documents from index", deleted.len());
        Ok(deleted.len())
    }

    async fn document_count(&self) -> Result<usize> {
        let response = self
            .client
            .get(self.url("docs/$count")?)
            .header("api-key", &self.api_key)
            .send()
            .await?;
        let response = check_status("docs/$count", response).await?;

        let text = response.text().await?;
        text.trim_start_matches('\u{feff}')
            .trim()
            .parse::<usize>()
            .map_err(|e| QnaError::Search(format!("Unexpected count response '{}': {}", text, e)))
    }
}
