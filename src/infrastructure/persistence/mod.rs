//! Storage implementations of the domain repository traits.
//!
//! # PostgreSQL
//!
//! - [`PgLinkRepository`] - Mapping store on the `links` table
//! - [`PgOwnershipIndex`] - Ownership index on the `owner_links` table
//!
//! # In-process
//!
//! - [`InMemoryLinkRepository`] - Mapping store for single-instance runs and tests
//! - [`InMemoryOwnershipIndex`] - Ownership index for single-instance runs and tests

pub mod memory_link_repository;
pub mod memory_ownership_index;
pub mod pg_link_repository;
pub mod pg_ownership_index;

pub use memory_link_repository::InMemoryLinkRepository;
pub use memory_ownership_index::InMemoryOwnershipIndex;
pub use pg_link_repository::PgLinkRepository;
pub use pg_ownership_index::PgOwnershipIndex;
