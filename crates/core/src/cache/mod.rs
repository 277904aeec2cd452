//! SQLite-backed cache for page content, extracted text, classification
//! results and model replies.
//!
//! This module provides a persistent, content-addressed cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - SHA-256 keys over length-prefixed key components
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Purges by domain, content type tag, or table

pub mod batch;
pub mod connection;
pub mod content;
pub mod hash;
pub mod migrations;
pub mod prompts;
pub mod results;
pub mod stats;

pub use crate::Error;

pub use batch::KeyedResultCache;
pub use connection::CacheDb;
pub use content::ContentRecord;
pub use stats::{CacheCounts, CacheStats, StatsSnapshot};
