//! Application layer - Use cases
//!
//! This layer contains:
//! - Services: Use-case orchestration over the repository
//! - Errors: Storage, configuration and top-level errors

pub mod errors;
pub mod services;
