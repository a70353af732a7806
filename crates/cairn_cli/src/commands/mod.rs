//! CLI command implementations.

pub mod object;
pub mod repo;
pub mod security;
pub mod sync;
