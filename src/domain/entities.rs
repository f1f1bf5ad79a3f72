use serde::Serialize;
use time::OffsetDateTime;

use super::listing::{reading_minutes, word_count};
use super::types::ContentBody;

/// Blog article as read from the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub body: ContentBody,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub views: Option<i64>,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    pub fn word_count(&self) -> usize {
        self.body.as_markdown().map(word_count).unwrap_or(0)
    }

    pub fn reading_minutes(&self) -> usize {
        reading_minutes(self.word_count())
    }
}

/// Portfolio entry as read from the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: ContentBody,
    pub tech_stack: Vec<String>,
    pub status: String,
    pub date_range: String,
    pub featured_image: Option<String>,
}

/// One entry of a document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingItem {
    pub id: String,
    pub text: String,
    pub level: u8,
}
