//! Application layer services implementing business logic.
//!
//! Services consume the repository and cache traits through `Arc<dyn _>` so
//! the storage backend can be chosen at startup.
//!
//! # Available Services
//!
//! - [`services::Allocator`] - Short code allocation with bounded collision retry
//! - [`services::Resolver`] - Redirect lookups, cache first
//! - [`services::LinkService`] - Listing and deletion of an owner's links
//! - [`services::SweepService`] - Retirement of expired links
//! - [`services::AuthService`] - Bearer token issuance and verification

pub mod services;
