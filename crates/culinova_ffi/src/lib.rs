//! Flutter bridge for Culinova core use-cases.

pub mod api;
