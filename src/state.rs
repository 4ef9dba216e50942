//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::{Allocator, AuthService, LinkService, Resolver};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Handles to the services behind the HTTP surface. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub allocator: Arc<Allocator>,
    pub resolver: Arc<Resolver>,
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    pub store: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
}
