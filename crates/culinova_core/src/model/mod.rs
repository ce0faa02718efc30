//! Domain model for the local user/recipe graph.
//!
//! # Responsibility
//! - Define canonical records used by repositories and services.
//! - Own field-level validation and label normalization.
//!
//! # Invariants
//! - Every record is identified by a stable v4 UUID.
//! - Timestamps are Unix epoch milliseconds.

pub mod media;
pub mod recipe;
pub mod user;
