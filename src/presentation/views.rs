use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::domain::about::{Education, Profile, WorkExperience};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub site_title: String,
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_title: String,
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            site_title: chrome.site_title,
            navigation: chrome.navigation,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

impl PageMetaView {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self { canonical, ..self }
    }

    pub fn with_content(self, title: String, description: String) -> Self {
        Self {
            title,
            description,
            ..self
        }
    }
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub iso_date: String,
    pub published: String,
    pub cover_image: Option<String>,
    pub reading_minutes: usize,
    pub badges: Vec<TagBadge>,
}

#[derive(Clone)]
pub struct TagSummary {
    pub label: String,
    pub href: String,
    pub count: usize,
    pub is_active: bool,
}

pub struct CategorySection {
    pub name: String,
    pub posts: Vec<PostCard>,
}

pub struct IndexContext {
    pub posts: Vec<PostCard>,
    pub categories: Vec<CategorySection>,
    pub tags: Vec<TagSummary>,
    pub active_tag: Option<String>,
    pub total_views: Option<i64>,
    pub posts_ld_json: Option<String>,
}

impl IndexContext {
    pub fn has_results(&self) -> bool {
        !self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexContext>,
}

#[derive(Clone)]
pub struct TocEntryView {
    pub id: String,
    pub text: String,
    pub level: u8,
}

pub struct PostDetailContext {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub published: String,
    pub iso_date: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub reading_minutes: usize,
    pub badges: Vec<TagBadge>,
    pub content_html: String,
    /// Raw block map for client-side rendering when bodies are not Markdown.
    pub blocks_json: Option<String>,
    pub toc: Vec<TocEntryView>,
    pub views: Option<i64>,
    pub ld_json: String,
}

impl PostDetailContext {
    pub fn has_toc(&self) -> bool {
        !self.toc.is_empty()
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ProjectCard {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub date_range: String,
    pub featured_image: Option<String>,
}

pub struct AboutContext {
    pub profile: Profile,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<ProjectCard>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<AboutContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page not found".to_string(),
            message: "The page you were looking for does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
