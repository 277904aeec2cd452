//! Core types and shared functionality for lessonlens.
//!
//! This crate provides:
//! - Cache implementation with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - Search result and classification types

pub mod cache;
pub mod config;
pub mod error;
pub mod types;

pub use cache::{CacheCounts, CacheDb, CacheStats, ContentRecord, KeyedResultCache, StatsSnapshot};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use types::{BatchItem, ClassificationResult, Label, SearchResult, truncate_chars};
