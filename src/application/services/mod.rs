//! Business logic services for the application layer.

pub mod allocator;
pub mod auth_service;
pub mod link_service;
pub mod resolver;
pub mod sweep_service;

pub use allocator::Allocator;
pub use auth_service::{AuthError, AuthService};
pub use link_service::LinkService;
pub use resolver::Resolver;
pub use sweep_service::{SweepService, run_expiry_sweeper};
