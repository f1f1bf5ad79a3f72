//! Table-of-contents extraction over rendered article HTML.
//!
//! [`outline_article`] walks the headings inside the `[data-article]`
//! container, gives every heading that lacks an `id` a slug derived from its
//! text, and reports the resulting outline in document order. [`TocTracker`]
//! keeps that outline current as the article changes and follows which
//! heading is in view.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};

use crate::application::render::RenderError;
use crate::domain::{entities::HeadingItem, slug::AnchorSlugger};

const ARTICLE_HEADINGS: &str = "[data-article] h1, [data-article] h2, [data-article] h3, \
                                [data-article] h4, [data-article] h5, [data-article] h6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutline {
    pub html: String,
    pub headings: Vec<HeadingItem>,
}

#[derive(Debug, Default)]
struct ScannedHeading {
    level: u8,
    existing_id: Option<String>,
    text: String,
}

/// Assign missing heading ids inside the article container and collect the
/// outline. Headings without text and without an id are left untouched and
/// do not appear in the outline. An explicit id that repeats an earlier one
/// is replaced, so every id in the outline is unique.
pub fn outline_article(html: &str) -> Result<DocumentOutline, RenderError> {
    let scanned = scan_headings(html)?;

    let mut slugger = AnchorSlugger::new();
    for heading in &scanned {
        if let Some(id) = &heading.existing_id {
            slugger.reserve(id);
        }
    }

    let mut kept: HashSet<&str> = HashSet::new();
    let mut assigned: Vec<Option<String>> = Vec::with_capacity(scanned.len());
    let mut headings = Vec::new();
    for heading in &scanned {
        let id = match &heading.existing_id {
            Some(id) if kept.insert(id.as_str()) => {
                assigned.push(None);
                Some(id.clone())
            }
            // A repeated explicit id is renamed after itself: `x`, `x-2`.
            Some(id) => {
                let id = slugger.anchor_for(id);
                assigned.push(Some(id.clone()));
                Some(id)
            }
            None if heading.text.is_empty() => {
                assigned.push(None);
                None
            }
            None => {
                let id = slugger.anchor_for(&heading.text);
                assigned.push(Some(id.clone()));
                Some(id)
            }
        };
        if let Some(id) = id {
            headings.push(HeadingItem {
                id,
                text: heading.text.clone(),
                level: heading.level,
            });
        }
    }

    if assigned.iter().all(Option::is_none) {
        return Ok(DocumentOutline {
            html: html.to_string(),
            headings,
        });
    }

    let html = apply_ids(html, assigned)?;
    Ok(DocumentOutline { html, headings })
}

fn scan_headings(html: &str) -> Result<Vec<ScannedHeading>, RenderError> {
    let scanned = Rc::new(RefCell::new(Vec::<ScannedHeading>::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(ARTICLE_HEADINGS, {
                    let scanned = Rc::clone(&scanned);
                    move |el| {
                        let level = el
                            .tag_name()
                            .strip_prefix('h')
                            .and_then(|value| value.parse::<u8>().ok())
                            .unwrap_or(1);
                        let existing_id = el
                            .get_attribute("id")
                            .map(|id| id.trim().to_string())
                            .filter(|id| !id.is_empty());
                        scanned.borrow_mut().push(ScannedHeading {
                            level,
                            existing_id,
                            text: String::new(),
                        });
                        Ok(())
                    }
                }),
                text!(ARTICLE_HEADINGS, {
                    let scanned = Rc::clone(&scanned);
                    move |chunk| {
                        if let Some(current) = scanned.borrow_mut().last_mut() {
                            current.text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let mut headings = scanned.take();
    for heading in &mut headings {
        heading.text = normalize_text(&decode_entities(&heading.text));
    }
    Ok(headings)
}

fn apply_ids(html: &str, assigned: Vec<Option<String>>) -> Result<String, RenderError> {
    let assigned = Rc::new(assigned);
    let index = Rc::new(RefCell::new(0usize));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(ARTICLE_HEADINGS, {
                let assigned = Rc::clone(&assigned);
                let index = Rc::clone(&index);
                move |el| {
                    let mut idx = index.borrow_mut();
                    if let Some(Some(id)) = assigned.get(*idx) {
                        el.set_attribute("id", id)?;
                    }
                    *idx += 1;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the entities an HTML serializer emits for text content.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            decode_entity(entity).map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// One visibility change reported for an observed heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn new(id: impl Into<String>, is_intersecting: bool) -> Self {
        Self {
            id: id.into(),
            is_intersecting,
        }
    }
}

/// Live outline of one article plus the heading currently in view.
///
/// This is the state model for the client-side table of contents: the
/// outline produced by [`outline_article`] feeds it, and scroll observations
/// move the active heading.
#[derive(Debug, Default)]
pub struct TocTracker {
    headings: Vec<HeadingItem>,
    observed: HashSet<String>,
    active: Option<String>,
}

impl TocTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-collect headings after the article content changed. Returns the
    /// article with ids assigned. The observation set is replaced, and the
    /// active heading is dropped when it no longer exists.
    pub fn refresh(&mut self, html: &str) -> Result<String, RenderError> {
        let outline = outline_article(html)?;
        self.observed = outline
            .headings
            .iter()
            .map(|heading| heading.id.clone())
            .collect();
        if let Some(active) = &self.active
            && !self.observed.contains(active)
        {
            self.active = None;
        }
        self.headings = outline.headings;
        Ok(outline.html)
    }

    /// Apply a batch of visibility changes; the last intersecting observed
    /// heading becomes active. Returns the active id after the batch.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> Option<&str> {
        for entry in entries {
            if entry.is_intersecting && self.observed.contains(&entry.id) {
                self.active = Some(entry.id.clone());
            }
        }
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&HeadingItem> {
        let active = self.active.as_deref()?;
        self.headings.iter().find(|heading| heading.id == active)
    }

    pub fn headings(&self) -> &[HeadingItem] {
        &self.headings
    }
}
