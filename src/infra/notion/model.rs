//! Wire types for the subset of the Notion REST API this service reads.
//!
//! Every field is optional or defaulted: the CMS schema belongs to the site
//! owner, so absent or renamed properties must degrade instead of failing the
//! whole response.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Paginated list envelope (`POST /databases/{id}/query`, `GET /blocks/{id}/children`).
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: String,
    pub properties: HashMap<String, Property>,
    pub cover: Option<FileObject>,
    pub archived: bool,
    pub in_trash: bool,
}

impl Page {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<Vec<RichText>>,
    pub rich_text: Option<Vec<RichText>>,
    pub url: Option<String>,
    pub date: Option<DateValue>,
    pub people: Option<Vec<Person>>,
    pub multi_select: Option<Vec<SelectOption>>,
    pub select: Option<SelectOption>,
    pub status: Option<SelectOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RichText {
    pub plain_text: String,
    pub href: Option<String>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// Hosted (`file`) or linked (`external`) asset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileObject {
    pub external: Option<Link>,
    pub file: Option<Link>,
}

impl FileObject {
    pub fn url(&self) -> Option<&str> {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|link| link.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Link {
    pub url: String,
}

/// One content block. The type-specific payload stays as raw JSON under the
/// key named by `type`; [`Block::content`] reads it leniently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(skip)]
    pub children: Vec<Block>,
}

impl Block {
    pub fn raw_content(&self) -> Value {
        self.payload.get(&self.kind).cloned().unwrap_or(Value::Null)
    }

    pub fn content(&self) -> BlockContent {
        match self.payload.get(&self.kind) {
            Some(value) => BlockContent::deserialize(value).unwrap_or_default(),
            None => BlockContent::default(),
        }
    }
}

/// Union of the payload fields used across block types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockContent {
    pub rich_text: Vec<RichText>,
    pub caption: Vec<RichText>,
    pub language: Option<String>,
    pub checked: Option<bool>,
    pub url: Option<String>,
    pub expression: Option<String>,
    pub title: Option<String>,
    pub external: Option<Link>,
    pub file: Option<Link>,
    pub cells: Vec<Vec<RichText>>,
    pub has_column_header: bool,
}

impl BlockContent {
    pub fn asset_url(&self) -> Option<&str> {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|link| link.url.as_str())
            .or(self.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

pub fn plain_text(segments: &[RichText]) -> String {
    segments
        .iter()
        .map(|segment| segment.plain_text.as_str())
        .collect()
}
