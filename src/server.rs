//! HTTP server initialization and runtime setup.
//!
//! Builds the storage backend, cache and services from [`Config`], spawns the
//! expiry sweeper and runs the Axum server until Ctrl-C.

use crate::application::services::{
    Allocator, AuthService, LinkService, Resolver, SweepService, run_expiry_sweeper,
};
use crate::config::{Config, StorageBackend};
use crate::domain::repositories::{LinkRepository, OwnershipIndex};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    InMemoryLinkRepository, InMemoryOwnershipIndex, PgLinkRepository, PgOwnershipIndex,
};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::build_generator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Store, index and cache chosen for this process.
pub struct Backends {
    pub store: Arc<dyn LinkRepository>,
    pub index: Arc<dyn OwnershipIndex>,
    pub cache: Arc<dyn CacheService>,
}

/// Opens the PostgreSQL pool, retrying with exponential backoff, and applies migrations.
///
/// # Errors
///
/// Returns an error if no connection could be made within `DB_CONNECT_RETRIES`
/// attempts or a migration fails.
pub async fn connect_postgres(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres backend")?;

    let strategy = ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(config.db_connect_retries);

    let pool = Retry::start(strategy, move || async move {
        PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
            .connect(database_url)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Database connection attempt failed"))
    })
    .await
    .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    Ok(pool)
}

/// Connects Redis if configured, falling back to [`NullCache`].
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Builds the configured storage backend and cache.
pub async fn build_backends(config: &Config) -> Result<Backends> {
    let store: Arc<dyn LinkRepository>;
    let index: Arc<dyn OwnershipIndex>;

    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = Arc::new(connect_postgres(config).await?);
            store = Arc::new(PgLinkRepository::new(pool.clone()));
            index = Arc::new(PgOwnershipIndex::new(pool));
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; links are lost on restart");
            store = Arc::new(InMemoryLinkRepository::new());
            index = Arc::new(InMemoryOwnershipIndex::new());
        }
    }

    let cache = connect_cache(config).await;

    Ok(Backends {
        store,
        index,
        cache,
    })
}

/// Wires services on top of the given backends.
pub fn build_state(config: &Config, backends: &Backends) -> AppState {
    let generator = build_generator(config.code_strategy, config.code_length);

    AppState {
        allocator: Arc::new(Allocator::new(
            backends.store.clone(),
            backends.index.clone(),
            generator,
            config.allocation_max_attempts,
        )),
        resolver: Arc::new(Resolver::new(
            backends.store.clone(),
            backends.cache.clone(),
            config.cache_ttl_seconds,
        )),
        link_service: Arc::new(LinkService::new(
            backends.store.clone(),
            backends.index.clone(),
            backends.cache.clone(),
            config.base_url.clone(),
        )),
        auth_service: Arc::new(AuthService::new(&config.jwt_secret, config.jwt_ttl_seconds)),
        store: backends.store.clone(),
        cache: backends.cache.clone(),
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Mapping store and ownership index (PostgreSQL with migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Background expiry sweeper (unless `SWEEP_INTERVAL_SECONDS=0`)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let backends = build_backends(&config).await?;
    let state = build_state(&config, &backends);

    if config.sweep_interval_seconds > 0 {
        let sweeper = Arc::new(SweepService::new(
            backends.store.clone(),
            backends.index.clone(),
            backends.cache.clone(),
        ));
        tokio::spawn(run_expiry_sweeper(
            sweeper,
            Duration::from_secs(config.sweep_interval_seconds),
        ));
    }

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
