//! Page properties → domain entities. Missing or mistyped properties fall
//! back to defaults; mapping never fails.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use super::model::{Page, Property, plain_text};
use crate::domain::{
    entities::{Post, Project},
    listing::summarize,
    slug::slugify,
    types::ContentBody,
};

pub const UNTITLED: &str = "Untitled";
pub const PUBLISHED: &str = "Published";

/// Post slug: the page id with hyphens removed.
pub fn post_slug(page_id: &str) -> String {
    page_id.chars().filter(|ch| *ch != '-').collect()
}

/// Listing entry. The body is left empty; the description comes from a
/// `Description` property when the database has one.
pub fn page_to_post(page: &Page) -> Post {
    let description = text_property(page.property("Description")).unwrap_or_default();

    Post {
        id: page.id.clone(),
        title: title(page),
        slug: post_slug(&page.id),
        cover_image: cover_image(page),
        description,
        published_at: published_at(page.property("Published Date")),
        body: ContentBody::empty(),
        author: author(page),
        tags: multi_select(page.property("Tags")),
        category: page
            .property("Category")
            .and_then(|property| property.select.as_ref())
            .map(|option| option.name.trim().to_string())
            .filter(|name| !name.is_empty()),
        views: None,
    }
}

/// Full post; the description is derived from the body when it is Markdown.
pub fn page_to_full_post(page: &Page, body: ContentBody) -> Post {
    let mut post = page_to_post(page);
    if let Some(markdown) = body.as_markdown() {
        let summary = summarize(markdown);
        if !summary.is_empty() {
            post.description = summary;
        }
    }
    post.body = body;
    post
}

pub fn page_to_project(page: &Page, body: ContentBody) -> Project {
    let title = title(page);
    let slug = match slugify(&title) {
        slug if slug.is_empty() => page.id.clone(),
        slug => slug,
    };
    let description = text_property(page.property("Description"))
        .or_else(|| body.as_markdown().map(summarize))
        .unwrap_or_default();

    Project {
        id: page.id.clone(),
        title,
        slug,
        description,
        tech_stack: multi_select(page.property("Tech Stack")),
        status: status(page).unwrap_or_else(|| PUBLISHED.to_string()),
        date_range: text_property(page.property("Date Range")).unwrap_or_default(),
        featured_image: page
            .property("Featured Image")
            .and_then(|property| property.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        body,
    }
}

/// `Status` property value, from either a status or a select property.
pub fn status(page: &Page) -> Option<String> {
    let property = page.property("Status")?;
    property
        .status
        .as_ref()
        .or(property.select.as_ref())
        .map(|option| option.name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// A page without a `Status` property is treated as published.
pub fn is_published(page: &Page) -> bool {
    status(page).is_none_or(|value| value == PUBLISHED)
}

fn title(page: &Page) -> String {
    let joined = page
        .property("Title")
        .and_then(|property| property.title.as_deref())
        .map(plain_text)
        .unwrap_or_default();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

fn cover_image(page: &Page) -> Option<String> {
    page.property("Featured Image")
        .and_then(|property| property.url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .or_else(|| page.cover.as_ref().and_then(|cover| cover.url()))
        .map(str::to_string)
}

fn author(page: &Page) -> Option<String> {
    page.property("Author")
        .and_then(|property| property.people.as_ref())
        .and_then(|people| people.first())
        .and_then(|person| person.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn multi_select(property: Option<&Property>) -> Vec<String> {
    property
        .and_then(|property| property.multi_select.as_ref())
        .map(|options| {
            options
                .iter()
                .map(|option| option.name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn text_property(property: Option<&Property>) -> Option<String> {
    let text = plain_text(property?.rich_text.as_deref()?);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn published_at(property: Option<&Property>) -> OffsetDateTime {
    property
        .and_then(|property| property.date.as_ref())
        .and_then(|date| date.start.as_deref())
        .and_then(parse_date)
        .unwrap_or_else(OffsetDateTime::now_utc)
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
