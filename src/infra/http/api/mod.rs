mod error;
mod handlers;
mod models;
mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

use crate::infra::http::RouterState;

pub(super) fn routes() -> Router<RouterState> {
    Router::new()
        .route(
            "/api/page-views",
            get(handlers::get_page_views).post(handlers::record_page_view),
        )
        .route(
            "/api/views/",
            get(handlers::missing_slug).post(handlers::missing_slug),
        )
        .route(
            "/api/views/{slug}",
            get(handlers::get_post_views).post(handlers::record_post_view),
        )
        .route("/api/projects", get(handlers::list_projects))
        .route("/api/projects/", get(handlers::missing_project_slug))
        .route("/api/projects/{slug}", get(handlers::get_project))
}
