//! Infrastructure adapters and runtime bootstrap.

pub mod about;
pub mod db;
pub mod error;
pub mod http;
pub mod memory;
pub mod notion;
pub mod telemetry;
