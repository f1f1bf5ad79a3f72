//! Application services: content, view counters, rendering, and outlines.

pub mod blog;
pub mod content;
pub mod error;
pub mod render;
pub mod repos;
pub mod retry;
pub mod scope;
pub mod toc;
pub mod views;
