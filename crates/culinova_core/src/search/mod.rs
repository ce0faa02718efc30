//! Full-text recipe search.
//!
//! # Responsibility
//! - Expose query APIs backed by the `recipes_fts` FTS5 index.
//! - Keep search result shaping inside core.

pub mod fts;
