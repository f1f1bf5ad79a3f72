#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use time::macros::datetime;
use tower::ServiceExt;
use url::Url;

use folio::application::blog::BlogService;
use folio::application::content::{ContentService, ContentSource, SourceError};
use folio::application::repos::{RepoError, ViewCountersRepo};
use folio::application::retry::RetryPolicy;
use folio::application::views::ViewCounterService;
use folio::config::SiteSettings;
use folio::domain::about::AboutContent;
use folio::domain::entities::{Post, Project};
use folio::domain::types::{ContentBody, CounterKey};
use folio::infra::http::{ApiState, CookiePolicy, HttpState, RouterState, build_router};
use folio::infra::memory::MemoryViewCounters;

/// In-memory CMS with a switch to make every call fail.
#[derive(Default)]
pub struct FakeSource {
    pub posts: Vec<Post>,
    pub projects: Vec<Project>,
    pub unavailable: AtomicBool,
}

impl FakeSource {
    fn check(&self) -> Result<(), SourceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SourceError::status(502, "bad_gateway", "upstream down"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query_published_posts(&self) -> Result<Vec<Post>, SourceError> {
        self.check()?;
        Ok(self.posts.clone())
    }

    async fn fetch_post(&self, id: &str) -> Result<Option<Post>, SourceError> {
        self.check()?;
        Ok(self.posts.iter().find(|post| post.slug == id).cloned())
    }

    async fn query_project_ids(&self) -> Result<Vec<String>, SourceError> {
        self.check()?;
        Ok(self.projects.iter().map(|project| project.id.clone()).collect())
    }

    async fn fetch_project(&self, id: &str) -> Result<Option<Project>, SourceError> {
        self.check()?;
        Ok(self.projects.iter().find(|project| project.id == id).cloned())
    }
}

/// Counter store whose every call fails.
pub struct BrokenCounters;

#[async_trait]
impl ViewCountersRepo for BrokenCounters {
    async fn read_count(&self, _key: &CounterKey) -> Result<Option<i64>, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn increment(&self, _key: &CounterKey) -> Result<i64, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }
}

pub fn sample_post(slug: &str, tags: &[&str]) -> Post {
    Post {
        id: slug.to_string(),
        title: format!("Post {slug}"),
        slug: slug.to_string(),
        cover_image: None,
        description: format!("About {slug}"),
        published_at: datetime!(2024-03-01 09:00 UTC),
        body: ContentBody::Markdown(format!("# Intro\n\nBody of {slug}.\n\n## Details\n\nMore.")),
        author: Some("Ada".to_string()),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        category: Some("Engineering".to_string()),
        views: None,
    }
}

pub fn sample_project(id: &str, slug: &str) -> Project {
    Project {
        id: id.to_string(),
        title: format!("Project {slug}"),
        slug: slug.to_string(),
        description: "Side project".to_string(),
        body: ContentBody::Markdown("Built with Rust.".to_string()),
        tech_stack: vec!["Rust".to_string(), "Postgres".to_string()],
        status: "Published".to_string(),
        date_range: "2023 - 2024".to_string(),
        featured_image: None,
    }
}

pub fn site() -> SiteSettings {
    SiteSettings {
        public_url: Url::parse("https://blog.example.com/").expect("url"),
        title: "Folio".to_string(),
        about_file: "content/about.toml".into(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub source: Arc<FakeSource>,
}

pub fn app_with(source: FakeSource, counters: Arc<dyn ViewCountersRepo>) -> TestApp {
    let source = Arc::new(source);
    let content = ContentService::new(source.clone() as Arc<dyn ContentSource>);
    let views = ViewCounterService::new(counters, RetryPolicy::none());
    let blog = BlogService::new(
        content.clone(),
        views.clone(),
        Arc::new(AboutContent::default()),
        site(),
    );

    let state = RouterState {
        http: HttpState {
            blog: Arc::new(blog),
            cookies: CookiePolicy::default(),
        },
        api: ApiState {
            views: Arc::new(views),
            content: Arc::new(content),
            cookies: CookiePolicy::default(),
        },
    };

    TestApp {
        router: build_router(state),
        source,
    }
}

pub fn app(source: FakeSource) -> (TestApp, MemoryViewCounters) {
    let counters = MemoryViewCounters::new();
    let app = app_with(source, Arc::new(counters.clone()));
    (app, counters)
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .expect("request")
}

pub fn post(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

/// `name=value` pairs from every Set-Cookie header.
pub fn set_cookies(response: &Response<Body>) -> HashMap<String, String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}
