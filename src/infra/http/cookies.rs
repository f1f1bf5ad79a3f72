//! Visitor-window cookies for the view counters.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::application::views::Visit;
use crate::config::ViewsSettings;

pub const VISITOR_COOKIE: &str = "blog_visitor_id";

const POST_COOKIE_PREFIX: &str = "post_viewed_";

/// Cookie name marking a post as counted for this visitor. The slug is
/// form-encoded so it stays a valid cookie-name token.
pub fn post_cookie_name(slug: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    format!("{POST_COOKIE_PREFIX}{encoded}")
}

/// Window state of the site-wide counter for this request.
pub fn site_visit(jar: &CookieJar) -> Visit {
    Visit::from_cookie_present(jar.get(VISITOR_COOKIE).is_some())
}

/// Window state of one post's counter for this request.
pub fn post_visit(jar: &CookieJar, slug: &str) -> Visit {
    Visit::from_cookie_present(jar.get(&post_cookie_name(slug)).is_some())
}

#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    max_age: time::Duration,
    secure: bool,
}

impl CookiePolicy {
    pub fn new(max_age: time::Duration, secure: bool) -> Self {
        Self { max_age, secure }
    }

    pub fn from_settings(settings: &ViewsSettings) -> Self {
        Self::new(settings.cookie_max_age, settings.secure_cookies)
    }

    /// Fresh site-wide visitor cookie with a random id.
    pub fn visitor_cookie(&self) -> Cookie<'static> {
        self.build(VISITOR_COOKIE.to_string(), Uuid::new_v4().to_string())
    }

    pub fn post_cookie(&self, slug: &str) -> Cookie<'static> {
        self.build(post_cookie_name(slug), "true".to_string())
    }

    /// Opens the site window after a counted first visit.
    pub fn open_site_window(&self, jar: CookieJar, visit: Visit) -> CookieJar {
        match visit {
            Visit::FirstInWindow => jar.add(self.visitor_cookie()),
            Visit::Repeat => jar,
        }
    }

    pub fn open_post_window(&self, jar: CookieJar, slug: &str, visit: Visit) -> CookieJar {
        match visit {
            Visit::FirstInWindow => jar.add(self.post_cookie(slug)),
            Visit::Repeat => jar,
        }
    }

    fn build(&self, name: String, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.max_age)
            .build()
    }
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self::from_settings(&ViewsSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_cookie_names_are_token_safe() {
        assert_eq!(post_cookie_name("abc123"), "post_viewed_abc123");
        assert_eq!(post_cookie_name("a b;c"), "post_viewed_a+b%3Bc");
    }

    #[test]
    fn cookies_carry_window_attributes() {
        let policy = CookiePolicy::new(time::Duration::hours(24), true);
        let cookie = policy.visitor_cookie();

        assert_eq!(cookie.name(), VISITOR_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86_400)));
        assert!(Uuid::parse_str(cookie.value()).is_ok());

        let post = policy.post_cookie("abc");
        assert_eq!(post.name(), "post_viewed_abc");
        assert_eq!(post.value(), "true");
    }

    #[test]
    fn windows_open_only_on_first_visit() {
        let policy = CookiePolicy::default();

        let jar = policy.open_site_window(CookieJar::new(), Visit::FirstInWindow);
        assert_eq!(site_visit(&jar), Visit::Repeat);
        let untouched = policy.open_site_window(CookieJar::new(), Visit::Repeat);
        assert_eq!(site_visit(&untouched), Visit::FirstInWindow);

        let jar = policy.open_post_window(CookieJar::new(), "hello", Visit::FirstInWindow);
        assert_eq!(post_visit(&jar, "hello"), Visit::Repeat);
        assert_eq!(post_visit(&jar, "other"), Visit::FirstInWindow);
    }
}
