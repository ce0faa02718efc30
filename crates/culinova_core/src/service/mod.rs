//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod recipe_service;
pub mod session_service;
pub mod social_service;
pub mod step_service;
