//! Page composition: turns CMS content, counters and profile data into view
//! contexts. Upstream failures degrade to empty pages with an error log.

use std::sync::Arc;

use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use tracing::{error, warn};
use url::Url;

use crate::{
    application::{
        content::ContentService,
        render::MarkdownRenderer,
        scope::FetchScope,
        views::{ViewCounterService, Visit},
    },
    config::SiteSettings,
    domain::{
        about::AboutContent,
        entities::{HeadingItem, Post, Project},
        headings::{DEFAULT_MAX_LEVEL, extract_headings},
        listing::{filter_by_tag, group_by_category, tag_counts},
        types::{ContentBody, CounterKey},
    },
    presentation::views::{
        AboutContext, CategorySection, IndexContext, LayoutChrome, NavigationLinkView,
        PageMetaView, PostCard, PostDetailContext, ProjectCard, TagBadge, TagSummary,
        TocEntryView,
    },
};

const SOURCE: &str = "application::blog::BlogService";
const GUEST_AUTHOR: &str = "Guest Author";

pub struct BlogService {
    content: ContentService,
    views: ViewCounterService,
    renderer: MarkdownRenderer,
    about: Arc<AboutContent>,
    site: SiteSettings,
}

impl BlogService {
    pub fn new(
        content: ContentService,
        views: ViewCounterService,
        about: Arc<AboutContent>,
        site: SiteSettings,
    ) -> Self {
        Self {
            content,
            views,
            renderer: MarkdownRenderer::new(),
            about,
            site,
        }
    }

    pub fn chrome(&self) -> LayoutChrome {
        LayoutChrome {
            site_title: self.site.title.clone(),
            navigation: vec![
                NavigationLinkView {
                    label: "Posts".to_string(),
                    href: "/".to_string(),
                },
                NavigationLinkView {
                    label: "About".to_string(),
                    href: "/about".to_string(),
                },
            ],
            meta: PageMetaView {
                title: self.site.title.clone(),
                description: self.about.profile.bio.clone(),
                canonical: self.canonical_url("/"),
            },
        }
    }

    pub fn canonical_url(&self, path: &str) -> String {
        canonical_url(&self.site.public_url, path)
    }

    /// Post listing. The visit is applied to the site-wide counter.
    pub async fn index(&self, tag: Option<&str>, site_visit: Visit) -> IndexContext {
        let tag = tag.map(str::trim).filter(|tag| !tag.is_empty());
        let posts = self.content.published_posts_or_empty().await;

        let tags = tag_counts(&posts)
            .into_iter()
            .map(|entry| TagSummary {
                href: tag_href(&entry.tag),
                is_active: tag == Some(entry.tag.as_str()),
                label: entry.tag,
                count: entry.count,
            })
            .collect();

        let filtered: Vec<Post> = filter_by_tag(&posts, tag).into_iter().cloned().collect();
        let categories = group_by_category(&filtered)
            .into_iter()
            .map(|group| CategorySection {
                name: group.category,
                posts: group.posts.into_iter().map(post_card).collect(),
            })
            .collect();
        let cards: Vec<PostCard> = filtered.iter().map(post_card).collect();

        let total_views = self.record_site_visit(site_visit).await;

        IndexContext {
            posts_ld_json: self.blog_ld_json(&cards),
            posts: cards,
            categories,
            tags,
            active_tag: tag.map(str::to_string),
            total_views,
        }
    }

    /// `None` when the post is unknown, unpublished, or the CMS is unavailable.
    /// Otherwise the visit is applied to the post's counter.
    pub async fn post_detail(&self, slug: &str, post_visit: Visit) -> Option<PostDetailContext> {
        let mut scope = FetchScope::new();
        let post = self.content.post_or_none(&mut scope, slug).await?;

        let (content_html, headings, blocks_json) = match &post.body {
            ContentBody::Markdown(markdown) => {
                let (html, headings) = self.render_markdown(&post.slug, markdown);
                (html, headings, None)
            }
            ContentBody::Blocks(blocks) => (
                String::new(),
                Vec::new(),
                serde_json::to_string(blocks).ok().map(|json| escape_script(&json)),
            ),
        };

        let views = match CounterKey::post(&post.slug) {
            Ok(key) => match self.views.record(&key, post_visit).await {
                Ok(views) => Some(views),
                Err(err) => {
                    error!(target = SOURCE, slug = %post.slug, error = %err, "failed to record post view");
                    None
                }
            },
            Err(_) => None,
        };

        let (published, iso_date) = format_dates(post.published_at);
        let author = post
            .author
            .clone()
            .unwrap_or_else(|| GUEST_AUTHOR.to_string());

        Some(PostDetailContext {
            ld_json: self.post_ld_json(&post, &author, &iso_date),
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.description.clone(),
            published,
            iso_date,
            author,
            cover_image: post.cover_image.clone(),
            reading_minutes: post.reading_minutes(),
            badges: tag_badges(&post.tags),
            content_html,
            blocks_json,
            toc: headings.into_iter().map(toc_entry).collect(),
            views,
        })
    }

    pub async fn about(&self) -> AboutContext {
        let mut scope = FetchScope::new();
        let projects = self.content.projects_or_empty(&mut scope).await;
        let about = self.about.as_ref().clone();

        AboutContext {
            profile: about.profile,
            work_experience: about.work_experience,
            education: about.education,
            skills: about.skills,
            projects: projects.iter().map(project_card).collect(),
        }
    }

    /// Applies one page load to the site-wide counter. `None` when the store
    /// failed, in which case the visitor window must stay closed.
    pub async fn record_site_visit(&self, visit: Visit) -> Option<i64> {
        match self.views.record(&CounterKey::SiteTotal, visit).await {
            Ok(total) => Some(total),
            Err(err) => {
                error!(target = SOURCE, error = %err, "failed to record site visit");
                None
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), crate::application::repos::RepoError> {
        self.views.health_check().await
    }

    /// Rendered article and its outline. When rendering fails the raw
    /// Markdown is shown escaped and the outline comes from the source text.
    fn render_markdown(&self, slug: &str, markdown: &str) -> (String, Vec<HeadingItem>) {
        match self.renderer.render(markdown) {
            Ok(article) => (article.html, article.headings),
            Err(err) => {
                warn!(target = SOURCE, slug, error = %err, "falling back to plain article body");
                let escaped = ammonia::clean_text(markdown);
                (
                    format!("<div data-article><pre>{escaped}</pre></div>"),
                    extract_headings(markdown, DEFAULT_MAX_LEVEL),
                )
            }
        }
    }

    fn post_ld_json(&self, post: &Post, author: &str, iso_date: &str) -> String {
        let value = json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": post.title,
            "description": post.description,
            "image": post.cover_image,
            "datePublished": iso_date,
            "author": { "@type": "Person", "name": author },
            "mainEntityOfPage": {
                "@type": "WebPage",
                "@id": self.canonical_url(&format!("/posts/{}", post.slug)),
            },
        });
        escape_script(&value.to_string())
    }

    fn blog_ld_json(&self, cards: &[PostCard]) -> Option<String> {
        if cards.is_empty() {
            return None;
        }

        let blog_posts = cards
            .iter()
            .map(|card| {
                json!({
                    "@type": "BlogPosting",
                    "headline": card.title,
                    "description": card.excerpt,
                    "datePublished": card.iso_date,
                    "url": self.canonical_url(&format!("/posts/{}", card.slug)),
                })
            })
            .collect::<Vec<_>>();

        serde_json::to_string(&json!({
            "@context": "https://schema.org",
            "@type": "Blog",
            "name": self.site.title,
            "url": self.canonical_url("/"),
            "blogPost": blog_posts,
        }))
        .ok()
        .map(|json| escape_script(&json))
    }
}

fn post_card(post: &Post) -> PostCard {
    let (published, iso_date) = format_dates(post.published_at);
    PostCard {
        slug: post.slug.clone(),
        title: post.title.clone(),
        excerpt: post.description.clone(),
        iso_date,
        published,
        cover_image: post.cover_image.clone(),
        reading_minutes: post.reading_minutes(),
        badges: tag_badges(&post.tags),
    }
}

fn project_card(project: &Project) -> ProjectCard {
    ProjectCard {
        slug: project.slug.clone(),
        title: project.title.clone(),
        description: project.description.clone(),
        tech_stack: project.tech_stack.clone(),
        date_range: project.date_range.clone(),
        featured_image: project.featured_image.clone(),
    }
}

fn tag_badges(tags: &[String]) -> Vec<TagBadge> {
    tags.iter()
        .map(|tag| TagBadge {
            label: tag.clone(),
            href: tag_href(tag),
        })
        .collect()
}

fn tag_href(tag: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
    format!("/?tag={encoded}")
}

fn toc_entry(heading: HeadingItem) -> TocEntryView {
    TocEntryView {
        id: heading.id,
        text: heading.text,
        level: heading.level,
    }
}

/// Human-readable date and RFC 3339 timestamp.
fn format_dates(at: OffsetDateTime) -> (String, String) {
    let human = at
        .format(format_description!(
            "[month repr:long] [day padding:none], [year]"
        ))
        .unwrap_or_default();
    let iso = at.format(&Rfc3339).unwrap_or_default();
    (human, iso)
}

pub(crate) fn canonical_url(base: &Url, path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    match base.join(trimmed) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{trimmed}", base.as_str()),
    }
}

/// Keep inline JSON from closing its `<script>` element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn canonical_urls_join_paths() {
        let base = Url::parse("https://blog.example/").expect("url");
        assert_eq!(canonical_url(&base, "/"), "https://blog.example/");
        assert_eq!(
            canonical_url(&base, "/posts/abc"),
            "https://blog.example/posts/abc"
        );
    }

    #[test]
    fn dates_render_human_and_iso() {
        let (human, iso) = format_dates(datetime!(2024-03-01 0:00 UTC));
        assert_eq!(human, "March 1, 2024");
        assert_eq!(iso, "2024-03-01T00:00:00Z");
    }

    #[test]
    fn tag_links_are_query_encoded() {
        assert_eq!(tag_href("rust & web"), "/?tag=rust+%26+web");
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        assert_eq!(escape_script(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
    }
}
