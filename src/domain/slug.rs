//! Deterministic, URL-fragment-safe slugs for headings and content keys.
//!
//! Punctuation is dropped before normalisation so `don't` becomes `dont`
//! rather than `don-t`; the `slug` crate then transliterates non-ASCII text,
//! lowercases, and collapses every other separator run into one hyphen.

use std::collections::HashMap;

use slug::slugify as normalize;
use thiserror::Error;

/// Characters removed outright before whitespace is turned into hyphens.
const STRIPPED_PUNCTUATION: &str = "`~!@#$%^&*()_+=[]{}|;:'\",.<>/?";

/// Anchor used when a heading has no sluggable characters at all.
const FALLBACK_ANCHOR: &str = "section";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Slug for arbitrary text. Output only contains `[a-z0-9-]` and never starts
/// or ends with a hyphen; it is empty when nothing sluggable remains.
pub fn slugify(input: &str) -> String {
    let stripped: String = input
        .trim()
        .chars()
        .filter(|ch| !STRIPPED_PUNCTUATION.contains(*ch))
        .collect();
    normalize(stripped)
}

/// Like [`slugify`], but reports inputs that cannot produce a slug.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Deterministically generate unique anchor slugs within a single document.
///
/// Headings processed in order receive monotonic suffixes when duplicates
/// occur (`setup`, `setup-2`, `setup-3`). Reserved ids (for example ids the
/// document already carries) are never handed out.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self {
            occurrences: HashMap::new(),
        }
    }

    /// Mark an id as taken without producing it.
    pub fn reserve(&mut self, id: &str) {
        self.occurrences.entry(id.to_string()).or_insert(1);
    }

    pub fn anchor_for(&mut self, heading: &str) -> String {
        let base = derive_slug(heading).unwrap_or_else(|_| FALLBACK_ANCHOR.to_string());
        let count = self.occurrences.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            return base;
        }

        let mut attempt = *count;
        loop {
            let candidate = format!("{base}-{attempt}");
            if !self.occurrences.contains_key(&candidate) {
                self.occurrences.insert(candidate.clone(), 1);
                if let Some(counter) = self.occurrences.get_mut(&base) {
                    *counter = attempt;
                }
                return candidate;
            }
            attempt += 1;
        }
    }
}
