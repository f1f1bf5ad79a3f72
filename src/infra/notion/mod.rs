//! Notion-backed content source.

mod client;
mod mapping;
mod markdown;
mod model;
mod source;

pub use client::NotionClient;
pub use source::NotionContentSource;
