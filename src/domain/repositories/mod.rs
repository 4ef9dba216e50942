//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the persistence engine. Implementations live in
//! `crate::infrastructure::persistence`; mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Mapping store with atomic insert-if-absent
//! - [`OwnershipIndex`] - Owner → codes listing, rebuildable from the store
//!
//! # Testing
//!
//! See integration tests in `tests/repository_link.rs` for PostgreSQL usage.

pub mod link_repository;
pub mod ownership_index;

pub use link_repository::{InsertOutcome, LinkRepository};
pub use ownership_index::OwnershipIndex;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use ownership_index::MockOwnershipIndex;
