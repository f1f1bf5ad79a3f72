use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    application::blog::BlogService,
    presentation::views::{
        AboutTemplate, IndexTemplate, LayoutChrome, LayoutContext, PageMetaView,
        PostDetailContext, PostTemplate, render_not_found_response, render_template_response,
    },
};

use super::cookies::{CookiePolicy, post_visit, site_visit};
use super::{RouterState, db_health_response};

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub cookies: CookiePolicy,
}

pub(super) fn routes() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/posts/{slug}", get(post_detail))
        .route("/about", get(about))
        .route("/_health/db", get(public_health))
        .fallback(not_found)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndexQuery {
    tag: Option<String>,
}

async fn index(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<IndexQuery>,
) -> Response {
    let chrome = state.blog.chrome();
    let visit = site_visit(&jar);
    let content = state.blog.index(query.tag.as_deref(), visit).await;
    let jar = match content.total_views {
        Some(_) => state.cookies.open_site_window(jar, visit),
        None => jar,
    };

    let view = LayoutContext::new(chrome, content);
    (jar, render_template_response(IndexTemplate { view }, StatusCode::OK)).into_response()
}

async fn post_detail(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let chrome = state.blog.chrome();

    let visit = post_visit(&jar, slug.trim());
    match state.blog.post_detail(&slug, visit).await {
        Some(content) => {
            let jar = count_site_visit(&state, jar).await;
            let jar = match content.views {
                Some(_) => state.cookies.open_post_window(jar, &content.slug, visit),
                None => jar,
            };
            let canonical = state.blog.canonical_url(&format!("/posts/{}", content.slug));
            let meta = post_meta(&chrome, &content, canonical);
            let view = LayoutContext::new(chrome.with_meta(meta), content);
            (jar, render_template_response(PostTemplate { view }, StatusCode::OK)).into_response()
        }
        None => (jar, render_not_found_response(chrome)).into_response(),
    }
}

async fn about(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let jar = count_site_visit(&state, jar).await;
    (jar, render_about(&state).await).into_response()
}

/// Every page load counts toward the site total once per visitor window.
async fn count_site_visit(state: &HttpState, jar: CookieJar) -> CookieJar {
    let visit = site_visit(&jar);
    match state.blog.record_site_visit(visit).await {
        Some(_) => state.cookies.open_site_window(jar, visit),
        None => jar,
    }
}

async fn render_about(state: &HttpState) -> Response {
    let chrome = state.blog.chrome();
    let meta = chrome
        .meta
        .clone()
        .with_canonical(state.blog.canonical_url("/about"))
        .with_content(format!("About | {}", chrome.site_title), chrome.meta.description.clone());
    let content = state.blog.about().await;
    let view = LayoutContext::new(chrome.with_meta(meta), content);
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.blog.health_check().await)
}

async fn not_found(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.blog.chrome())
}

fn post_meta(chrome: &LayoutChrome, content: &PostDetailContext, canonical: String) -> PageMetaView {
    let description = fallback_description(&content.excerpt, &chrome.meta.description);

    chrome
        .meta
        .clone()
        .with_canonical(canonical)
        .with_content(content.title.clone(), description)
}

fn fallback_description(candidate: &str, fallback: &str) -> String {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
