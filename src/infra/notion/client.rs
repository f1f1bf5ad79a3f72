use std::time::Duration;

use futures::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};
use reqwest::{
    Client, Method, StatusCode, Url,
    header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::model::{ApiErrorBody, Block, ListResponse, Page};
use crate::{
    application::{content::SourceError, retry::RetryPolicy},
    config::NotionSettings,
    infra::error::InfraError,
};

const PAGE_SIZE: u32 = 100;

/// Thin Notion REST client. Every call goes through the retry policy.
#[derive(Clone, Debug)]
pub struct NotionClient {
    http: Client,
    base: Url,
    token: Option<String>,
    version: String,
    retry: RetryPolicy,
}

impl NotionClient {
    pub fn new(settings: &NotionSettings, retry: RetryPolicy) -> Result<Self, InfraError> {
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base: settings.api_base_url.clone(),
            token: settings.token.clone(),
            version: settings.api_version.clone(),
            retry,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|err| SourceError::NotConfigured(format!("invalid API path `{path}`: {err}")))
    }

    /// All pages of a database query. `query` carries `filter` and `sorts`;
    /// pagination fields are added here.
    pub async fn query_database(
        &self,
        database_id: &str,
        query: &Map<String, Value>,
    ) -> Result<Vec<Page>, SourceError> {
        let url = self.url(&format!("databases/{database_id}/query"))?;
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = paged_query(query, cursor.as_deref());
            let response: ListResponse<Page> = self
                .send("query_database", Method::POST, &url, Some(&body))
                .await?;
            pages.extend(response.results);
            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!(database_id, pages = pages.len(), "queried notion database");
        Ok(pages)
    }

    pub async fn retrieve_page(&self, page_id: &str) -> Result<Page, SourceError> {
        let url = self.url(&format!("pages/{page_id}"))?;
        self.send("retrieve_page", Method::GET, &url, None).await
    }

    /// Direct children of a block, across all result pages.
    pub async fn list_block_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError> {
        let base = self.url(&format!("blocks/{block_id}/children"))?;
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", &PAGE_SIZE.to_string());
                if let Some(cursor) = cursor.as_deref() {
                    query.append_pair("start_cursor", cursor);
                }
            }

            let response: ListResponse<Block> = self
                .send("list_block_children", Method::GET, &url, None)
                .await?;
            blocks.extend(response.results);
            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    /// Children of `block_id` with nested children filled in. Sibling
    /// subtrees are fetched concurrently.
    pub fn block_tree<'a>(
        &'a self,
        block_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Block>, SourceError>> {
        async move {
            let mut blocks = self.list_block_children(block_id).await?;
            let nested = try_join_all(blocks.iter().map(|block| async move {
                if block.has_children {
                    self.block_tree(&block.id).await
                } else {
                    Ok(Vec::new())
                }
            }))
            .await?;

            for (block, children) in blocks.iter_mut().zip(nested) {
                block.children = children;
            }
            Ok(blocks)
        }
        .boxed()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<T, SourceError> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SourceError::NotConfigured("notion.token is not set".to_string()))?;

        self.retry
            .run(operation, || {
                self.send_once(operation, method.clone(), url.clone(), token, body)
            })
            .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        token: &str,
        body: Option<&Value>,
    ) -> Result<T, SourceError> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("Notion-Version", self.version.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            metrics::counter!(
                "folio_notion_request_total",
                "operation" => operation,
                "outcome" => "transport_error"
            )
            .increment(1);
            SourceError::Transport(err.to_string())
        })?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        metrics::counter!(
            "folio_notion_request_total",
            "operation" => operation,
            "outcome" => status.as_u16().to_string()
        )
        .increment(1);

        if !status.is_success() {
            return Err(status_error(status, &bytes, retry_after));
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| SourceError::Decode(format!("{operation}: {err}")))
    }
}

fn paged_query(query: &Map<String, Value>, cursor: Option<&str>) -> Value {
    let mut body = query.clone();
    body.insert("page_size".to_string(), json!(PAGE_SIZE));
    if let Some(cursor) = cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    Value::Object(body)
}

/// `Retry-After` in delta-seconds form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn status_error(status: StatusCode, bytes: &[u8], retry_after: Option<Duration>) -> SourceError {
    let body: ApiErrorBody = serde_json::from_slice(bytes).unwrap_or_default();
    let code = if body.code.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown")
            .to_ascii_lowercase()
            .replace(' ', "_")
    } else {
        body.code
    };
    let message = if body.message.is_empty() {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        body.message
    };

    SourceError::Status {
        status: status.as_u16(),
        code,
        message,
        retry_after,
    }
}
