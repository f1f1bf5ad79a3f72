//! Request-scoped memo of CMS lookups.
//!
//! One `FetchScope` is created per request and passed down explicitly, so a
//! page that needs the same entry twice (for example metadata and body) only
//! pays for one upstream round-trip. Nothing outlives the request.

use std::collections::HashMap;

use crate::domain::entities::{Post, Project};

#[derive(Debug, Default)]
pub struct FetchScope {
    posts: HashMap<String, Option<Post>>,
    projects: HashMap<String, Option<Project>>,
    project_index: Option<Vec<String>>,
}

impl FetchScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` records a lookup that found nothing.
    pub fn post(&self, id: &str) -> Option<Option<&Post>> {
        self.posts.get(id).map(Option::as_ref)
    }

    pub fn store_post(&mut self, id: &str, post: Option<Post>) {
        self.posts.insert(id.to_string(), post);
    }

    pub fn project(&self, id: &str) -> Option<Option<&Project>> {
        self.projects.get(id).map(Option::as_ref)
    }

    pub fn store_project(&mut self, id: &str, project: Option<Project>) {
        self.projects.insert(id.to_string(), project);
    }

    pub fn project_index(&self) -> Option<&[String]> {
        self.project_index.as_deref()
    }

    pub fn store_project_index(&mut self, ids: Vec<String>) {
        self.project_index = Some(ids);
    }
}
