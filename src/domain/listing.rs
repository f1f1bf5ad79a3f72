//! Aggregates used by the post listing pages.

use std::collections::BTreeMap;

use super::entities::Post;

/// Category label for posts that carry none.
pub const UNCATEGORIZED: &str = "Others";

const WORDS_PER_MINUTE: usize = 200;
const DESCRIPTION_LIMIT: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: String,
    pub posts: Vec<&'a Post>,
}

/// Number of posts per tag, sorted by tag name.
pub fn tag_counts(posts: &[Post]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect()
}

pub fn filter_by_tag<'a>(posts: &'a [Post], tag: Option<&str>) -> Vec<&'a Post> {
    match tag {
        Some(tag) => posts.iter().filter(|post| post.has_tag(tag)).collect(),
        None => posts.iter().collect(),
    }
}

/// Group posts by category in order of first appearance.
pub fn group_by_category(posts: &[Post]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for post in posts {
        let category = post
            .category
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        match groups.iter_mut().find(|group| group.category == category) {
            Some(group) => group.posts.push(post),
            None => groups.push(CategoryGroup {
                category: category.to_string(),
                posts: vec![post],
            }),
        }
    }
    groups
}

/// Words in `content` once punctuation is treated as whitespace.
pub fn word_count(content: &str) -> usize {
    content
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .filter(|word| !word.is_empty())
        .count()
}

pub fn reading_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// First non-empty line of a body, cut to 160 characters with an ellipsis.
pub fn summarize(markdown: &str) -> String {
    let first = markdown
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    let mut chars = first.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_LIMIT).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
