//! Folio: a blog and portfolio server backed by Notion content and
//! Postgres page-view counters.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
