//! Shared utilities, configuration, and error handling for HackHub
//!
//! This crate provides common functionality used across the HackHub service:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Request extractors and pagination
//! - State machine error types

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, StoreBackend};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
