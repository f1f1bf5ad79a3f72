//! Content fetching: the CMS boundary and the service pages talk to.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{error, warn};

use crate::application::{error::AppError, retry::Retryable, scope::FetchScope};
use crate::domain::{
    entities::{Post, Project},
    error::DomainError,
};

const SOURCE: &str = "application::content::ContentService";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source is not configured: {0}")]
    NotConfigured(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream responded with {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            code: code.into(),
            message: message.into(),
            retry_after: None,
        }
    }

    /// Upstream says the object does not exist (or the id is not a valid id).
    pub fn is_missing_object(&self) -> bool {
        matches!(
            self,
            SourceError::Status { status: 404, .. }
                | SourceError::Status { status: 400, .. }
        )
    }
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        match self {
            SourceError::Transport(_) => true,
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            SourceError::NotConfigured(_) | SourceError::Decode(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            SourceError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Read-only view of the CMS. Implementations fill defaults for missing
/// fields instead of failing.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Published posts without bodies, newest first.
    async fn query_published_posts(&self) -> Result<Vec<Post>, SourceError>;

    /// One post with its body; `None` when the CMS has no such entry.
    async fn fetch_post(&self, id: &str) -> Result<Option<Post>, SourceError>;

    /// Project entry ids, most recent first.
    async fn query_project_ids(&self) -> Result<Vec<String>, SourceError>;

    async fn fetch_project(&self, id: &str) -> Result<Option<Project>, SourceError>;
}

#[derive(Clone)]
pub struct ContentService {
    source: Arc<dyn ContentSource>,
}

impl ContentService {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    pub async fn published_posts(&self) -> Result<Vec<Post>, AppError> {
        let mut posts = self.source.query_published_posts().await?;
        posts.sort_by(|left, right| right.published_at.cmp(&left.published_at));
        Ok(posts)
    }

    /// Listing for page composition; upstream failures degrade to no posts.
    pub async fn published_posts_or_empty(&self) -> Vec<Post> {
        match self.published_posts().await {
            Ok(posts) => posts,
            Err(err) => {
                error!(target = SOURCE, error = %err, "failed to list published posts");
                Vec::new()
            }
        }
    }

    pub async fn post(&self, scope: &mut FetchScope, slug: &str) -> Result<Option<Post>, AppError> {
        let slug = require_slug(slug)?;
        if let Some(cached) = scope.post(slug) {
            return Ok(cached.cloned());
        }

        let post = self.source.fetch_post(slug).await?;
        scope.store_post(slug, post.clone());
        Ok(post)
    }

    /// Post lookup for page composition; errors are logged and read as absent.
    pub async fn post_or_none(&self, scope: &mut FetchScope, slug: &str) -> Option<Post> {
        match self.post(scope, slug).await {
            Ok(post) => post,
            Err(err) => {
                error!(target = SOURCE, slug, error = %err, "failed to load post");
                None
            }
        }
    }

    /// All projects with bodies. Entries that fail individually are dropped;
    /// a failing index query fails the call.
    pub async fn projects(&self, scope: &mut FetchScope) -> Result<Vec<Project>, AppError> {
        let ids = match scope.project_index() {
            Some(ids) => ids.to_vec(),
            None => {
                let ids = self.source.query_project_ids().await?;
                scope.store_project_index(ids.clone());
                ids
            }
        };

        let pending: Vec<&String> = ids.iter().filter(|id| scope.project(id).is_none()).collect();
        let fetched = join_all(pending.into_iter().map(|id| {
            let source = Arc::clone(&self.source);
            async move { (id, source.fetch_project(id).await) }
        }))
        .await;

        for (id, result) in fetched {
            match result {
                Ok(project) => scope.store_project(id, project),
                Err(err) => {
                    warn!(target = SOURCE, project_id = %id, error = %err, "dropping project");
                    scope.store_project(id, None);
                }
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| scope.project(id).flatten().cloned())
            .collect())
    }

    pub async fn projects_or_empty(&self, scope: &mut FetchScope) -> Vec<Project> {
        match self.projects(scope).await {
            Ok(projects) => projects,
            Err(err) => {
                error!(target = SOURCE, error = %err, "failed to list projects");
                Vec::new()
            }
        }
    }

    pub async fn project_by_slug(
        &self,
        scope: &mut FetchScope,
        slug: &str,
    ) -> Result<Project, AppError> {
        let slug = require_slug(slug)?;
        self.projects(scope)
            .await?
            .into_iter()
            .find(|project| project.slug == slug)
            .ok_or_else(|| DomainError::not_found("project").into())
    }
}

fn require_slug(slug: &str) -> Result<&str, AppError> {
    let trimmed = slug.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("slug is required"));
    }
    Ok(trimmed)
}
