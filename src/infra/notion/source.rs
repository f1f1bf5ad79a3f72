use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::{
    client::NotionClient,
    mapping::{PUBLISHED, is_published, page_to_full_post, page_to_post, page_to_project},
    markdown::{blocks_to_map, blocks_to_markdown},
    model::Page,
};
use crate::{
    application::content::{ContentSource, SourceError},
    config::NotionSettings,
    domain::{
        entities::{Post, Project},
        types::{BodyFormat, ContentBody},
    },
};

/// [`ContentSource`] backed by two Notion databases.
pub struct NotionContentSource {
    client: NotionClient,
    posts_database_id: Option<String>,
    projects_database_id: Option<String>,
    body_format: BodyFormat,
}

impl NotionContentSource {
    pub fn new(client: NotionClient, settings: &NotionSettings) -> Self {
        Self {
            client,
            posts_database_id: settings.posts_database_id.clone(),
            projects_database_id: settings.projects_database_id.clone(),
            body_format: settings.body_format,
        }
    }

    async fn body(&self, page_id: &str) -> Result<ContentBody, SourceError> {
        let blocks = self.client.block_tree(page_id).await?;
        Ok(match self.body_format {
            BodyFormat::Markdown => ContentBody::Markdown(blocks_to_markdown(&blocks)),
            BodyFormat::Blocks => ContentBody::Blocks(blocks_to_map(&blocks)),
        })
    }

    /// Live page for `id`; `None` when `id` is not a page id, when Notion
    /// reports it missing, or when it was archived.
    async fn live_page(&self, id: &str) -> Result<Option<Page>, SourceError> {
        if !is_page_id(id) {
            return Ok(None);
        }
        match self.client.retrieve_page(id).await {
            Ok(page) if page.archived || page.in_trash => Ok(None),
            Ok(page) => Ok(Some(page)),
            Err(err) if err.is_missing_object() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Notion page ids are 32 hex digits, optionally split by hyphens.
fn is_page_id(id: &str) -> bool {
    let mut digits = 0usize;
    for ch in id.chars() {
        match ch {
            '-' => {}
            ch if ch.is_ascii_hexdigit() => digits += 1,
            _ => return false,
        }
    }
    digits == 32
}

fn published_posts_query() -> Map<String, Value> {
    let mut query = Map::new();
    query.insert(
        "filter".to_string(),
        json!({ "property": "Status", "status": { "equals": PUBLISHED } }),
    );
    query.insert(
        "sorts".to_string(),
        json!([{ "property": "Published Date", "direction": "descending" }]),
    );
    query
}

fn projects_query() -> Map<String, Value> {
    let mut query = Map::new();
    query.insert(
        "sorts".to_string(),
        json!([{ "property": "Date Range", "direction": "descending" }]),
    );
    query
}

#[async_trait]
impl ContentSource for NotionContentSource {
    async fn query_published_posts(&self) -> Result<Vec<Post>, SourceError> {
        let database_id = self.posts_database_id.as_deref().ok_or_else(|| {
            SourceError::NotConfigured("notion.posts_database_id is not set".to_string())
        })?;

        let pages = self
            .client
            .query_database(database_id, &published_posts_query())
            .await?;

        Ok(pages
            .iter()
            .filter(|page| !page.archived && !page.in_trash)
            .map(page_to_post)
            .collect())
    }

    async fn fetch_post(&self, id: &str) -> Result<Option<Post>, SourceError> {
        let Some(page) = self.live_page(id).await? else {
            return Ok(None);
        };
        if !is_published(&page) {
            return Ok(None);
        }

        let body = self.body(&page.id).await?;
        Ok(Some(page_to_full_post(&page, body)))
    }

    async fn query_project_ids(&self) -> Result<Vec<String>, SourceError> {
        let Some(database_id) = self.projects_database_id.as_deref() else {
            warn!("notion.projects_database_id is not set; listing no projects");
            return Ok(Vec::new());
        };

        let pages = self
            .client
            .query_database(database_id, &projects_query())
            .await?;

        Ok(pages
            .into_iter()
            .filter(|page| !page.archived && !page.in_trash)
            .map(|page| page.id)
            .collect())
    }

    async fn fetch_project(&self, id: &str) -> Result<Option<Project>, SourceError> {
        let Some(page) = self.live_page(id).await? else {
            return Ok(None);
        };

        let body = self.body(&page.id).await?;
        Ok(Some(page_to_project(&page, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_query_filters_and_sorts() {
        let query = Value::Object(published_posts_query());
        assert_eq!(query["filter"]["property"], "Status");
        assert_eq!(query["filter"]["status"]["equals"], "Published");
        assert_eq!(query["sorts"][0]["property"], "Published Date");
        assert_eq!(query["sorts"][0]["direction"], "descending");
    }

    #[test]
    fn projects_query_sorts_by_date_range() {
        let query = Value::Object(projects_query());
        assert!(query.get("filter").is_none());
        assert_eq!(query["sorts"][0]["property"], "Date Range");
    }

    #[test]
    fn page_ids_accept_plain_and_hyphenated_hex() {
        assert!(is_page_id("0123456789abcdef0123456789ABCDEF"));
        assert!(is_page_id("01234567-89ab-cdef-0123-456789abcdef"));
    }

    #[test]
    fn page_ids_reject_path_and_query_characters() {
        for slug in [
            "",
            "hello-world",
            "..%2Fdatabases%2F0123456789abcdef0123456789abcdef",
            "../0123456789abcdef0123456789abcdef",
            "0123456789abcdef0123456789abcdef?filter=1",
            "0123456789abcdef0123456789abcdef#x",
            "0123456789abcdef0123456789abcdeg",
            "0123456789abcdef0123456789abcdef00",
        ] {
            assert!(!is_page_id(slug), "{slug} should be rejected");
        }
    }
}
