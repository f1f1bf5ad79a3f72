use serde::Serialize;
use serde_json::Value;

use crate::domain::{entities::Project, types::ContentBody};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalViewsResponse {
    pub total_views: i64,
}

#[derive(Debug, Serialize)]
pub struct PostViewsResponse {
    pub views: i64,
}

/// Project as served to the portfolio dialog. `content` holds Markdown; the
/// raw block map is sent as `recordMap` when bodies are delivered as blocks.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub tech_stack: Vec<String>,
    pub status: String,
    pub date_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(rename = "recordMap", skip_serializing_if = "Option::is_none")]
    pub record_map: Option<Value>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        let (content, record_map) = match project.body {
            ContentBody::Markdown(markdown) => (markdown, None),
            ContentBody::Blocks(blocks) => (String::new(), Some(blocks)),
        };

        Self {
            id: project.id,
            title: project.title,
            slug: project.slug,
            description: project.description,
            content,
            tech_stack: project.tech_stack,
            status: project.status,
            date_range: project.date_range,
            featured_image: project.featured_image,
            record_map,
        }
    }
}
