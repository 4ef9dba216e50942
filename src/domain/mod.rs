//! Domain layer containing business entities, errors and storage contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Storage trait definitions
//! - [`errors`] - Core error taxonomy
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on the HTTP layer
//! - Repository traits define contracts implemented by the infrastructure layer
//! - Allocation and resolution logic live in [`crate::application::services`]
//!
//! # Request Flow
//!
//! 1. Create: allocator → code generator → mapping store (insert-if-absent) → ownership index
//! 2. Redirect: resolver → mapping store (read) → caller

pub mod entities;
pub mod errors;
pub mod repositories;

pub use errors::{ShortenError, StoreError};
