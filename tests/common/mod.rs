#![allow(dead_code)]

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use shortener::api::handlers::{
    delete_link_handler, health_handler, list_links_handler, redirect_handler, shorten_handler,
};
use shortener::api::middleware::auth;
use shortener::application::services::{Allocator, AuthService, LinkService, Resolver};
use shortener::infrastructure::cache::{CacheService, NullCache};
use shortener::infrastructure::persistence::{InMemoryLinkRepository, InMemoryOwnershipIndex};
use shortener::state::AppState;
use shortener::utils::code_generator::{CodeGenerator, RandomCodeGenerator, Strategy};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";
pub const BASE_URL: &str = "https://s.example.com";

/// Memory-backed state plus direct handles on the backends.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryLinkRepository>,
    pub index: Arc<InMemoryOwnershipIndex>,
}

/// Produces codes from a deliberately tiny space so allocations collide.
pub struct NarrowGenerator {
    space: u64,
    counter: AtomicU64,
}

impl NarrowGenerator {
    pub fn new(space: u64) -> Self {
        Self {
            space,
            counter: AtomicU64::new(0),
        }
    }
}

impl CodeGenerator for NarrowGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Random
    }

    fn generate(&self, seed: u64) -> String {
        let mix = seed.wrapping_add(self.counter.fetch_add(1, Ordering::Relaxed));
        format!("col{:04}", mix % self.space)
    }
}

/// Always yields the same code.
pub struct FixedGenerator(pub &'static str);

impl CodeGenerator for FixedGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Random
    }

    fn generate(&self, _seed: u64) -> String {
        self.0.to_string()
    }
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(Arc::new(RandomCodeGenerator::new(7)), 10)
}

pub fn create_test_state_with(
    generator: Arc<dyn CodeGenerator>,
    max_attempts: u32,
) -> TestContext {
    build_test_state(generator, max_attempts, Arc::new(NullCache::new()))
}

/// Memory-backed state that caches redirects in `cache`.
pub fn create_test_state_with_cache(cache: Arc<dyn CacheService>) -> TestContext {
    build_test_state(Arc::new(RandomCodeGenerator::new(7)), 10, cache)
}

fn build_test_state(
    generator: Arc<dyn CodeGenerator>,
    max_attempts: u32,
    cache: Arc<dyn CacheService>,
) -> TestContext {
    let store = Arc::new(InMemoryLinkRepository::new());
    let index = Arc::new(InMemoryOwnershipIndex::new());

    let state = AppState {
        allocator: Arc::new(Allocator::new(
            store.clone(),
            index.clone(),
            generator,
            max_attempts,
        )),
        resolver: Arc::new(Resolver::new(store.clone(), cache.clone(), 3600)),
        link_service: Arc::new(LinkService::new(
            store.clone(),
            index.clone(),
            cache.clone(),
            BASE_URL,
        )),
        auth_service: Arc::new(AuthService::new(TEST_SECRET, 1200)),
        store: store.clone(),
        cache,
    };

    TestContext {
        state,
        store,
        index,
    }
}

/// Routes under test, without rate limiting (no peer address in tests).
pub fn test_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/links", get(list_links_handler))
        .route("/links/{code}", delete(delete_link_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state)
}

/// `Authorization` header value for `owner_id`.
pub fn bearer(state: &AppState, owner_id: Uuid) -> String {
    let token = state.auth_service.issue(owner_id).unwrap();
    format!("Bearer {}", token)
}
