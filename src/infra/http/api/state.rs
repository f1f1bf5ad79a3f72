use std::sync::Arc;

use crate::application::{content::ContentService, views::ViewCounterService};

use crate::infra::http::cookies::CookiePolicy;

#[derive(Clone)]
pub struct ApiState {
    pub views: Arc<ViewCounterService>,
    pub content: Arc<ContentService>,
    pub cookies: CookiePolicy,
}
