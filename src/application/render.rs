//! Markdown → sanitized article HTML with a heading outline.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Options, markdown_to_html};
use thiserror::Error;

use crate::application::toc::outline_article;
use crate::domain::entities::HeadingItem;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}

#[derive(Debug, Clone)]
pub struct RenderedArticle {
    pub html: String,
    pub headings: Vec<HeadingItem>,
}

/// Comrak with GFM extensions, followed by an Ammonia allow-list.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }

    pub fn render(&self, markdown: &str) -> Result<RenderedArticle, RenderError> {
        let rendered = markdown_to_html(markdown, &self.options);
        let sanitized = self.sanitizer.clean(&rendered).to_string();
        let wrapped = format!("<div data-article>{sanitized}</div>");
        let outline = outline_article(&wrapped)?;
        Ok(RenderedArticle {
            html: outline.html,
            headings: outline.headings,
        })
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    render.r#unsafe = true;

    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "aside",
        "blockquote",
        "br",
        "code",
        "del",
        "details",
        "div",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "img",
        "input",
        "li",
        "ol",
        "p",
        "pre",
        "section",
        "span",
        "strong",
        "summary",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "id",
        "title",
        "lang",
        "aria-label",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("aside", &["class"]);
    builder.add_tag_attributes("img", &["alt", "title", "width", "height"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("pre", &["lang"]);
    builder.add_tag_attributes("section", &["class"]);
    builder.add_tag_attributes("li", &["class"]);
    builder.add_tag_attributes("ul", &["class"]);
    builder.add_tag_attributes("th", &["align"]);
    builder.add_tag_attributes("td", &["align"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled", "class"]);

    builder.add_url_schemes(["http", "https", "mailto"].iter().copied());

    builder
}
