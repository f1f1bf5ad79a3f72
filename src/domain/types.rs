use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Counter row id shared by every page of the site.
pub const TOTAL_VIEWS_KEY: &str = "blog_total_views";

const POST_KEY_PREFIX: &str = "post:";

/// Identifies one counter row in the view store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterKey {
    SiteTotal,
    Post(String),
}

impl CounterKey {
    /// Build a per-post key, rejecting blank slugs.
    pub fn post(slug: &str) -> Result<Self, DomainError> {
        let trimmed = slug.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("post slug must not be empty"));
        }
        Ok(Self::Post(trimmed.to_string()))
    }

    /// Key persisted in the counter table. Post keys are namespaced so a post
    /// can never share a row with the site-wide total.
    pub fn storage_key(&self) -> String {
        match self {
            CounterKey::SiteTotal => TOTAL_VIEWS_KEY.to_string(),
            CounterKey::Post(slug) => format!("{POST_KEY_PREFIX}{slug}"),
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            CounterKey::SiteTotal => "site",
            CounterKey::Post(_) => "post",
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Shape in which entry bodies are delivered by the content fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    #[default]
    Markdown,
    Blocks,
}

impl BodyFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            BodyFormat::Markdown => "markdown",
            BodyFormat::Blocks => "blocks",
        }
    }
}

impl FromStr for BodyFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(BodyFormat::Markdown),
            "blocks" | "block_map" => Ok(BodyFormat::Blocks),
            other => Err(format!("unknown body format `{other}`")),
        }
    }
}

/// Displayable body of a post or project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum ContentBody {
    Markdown(String),
    /// Raw CMS block tree keyed by block id; rendered by the client.
    Blocks(serde_json::Value),
}

impl ContentBody {
    pub fn empty() -> Self {
        ContentBody::Markdown(String::new())
    }

    pub fn as_markdown(&self) -> Option<&str> {
        match self {
            ContentBody::Markdown(markdown) => Some(markdown.as_str()),
            ContentBody::Blocks(_) => None,
        }
    }
}

impl Default for ContentBody {
    fn default() -> Self {
        Self::empty()
    }
}
