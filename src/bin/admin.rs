//! CLI administration tool for the shortener.
//!
//! Mints bearer tokens and runs maintenance jobs without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Mint a token for a new random owner
//! cargo run --bin admin -- token issue
//!
//! # Mint a token for an existing owner
//! cargo run --bin admin -- token issue --owner 6f1c1a9e-3d4b-4e7f-9a55-0c2b8f1d7e21
//!
//! # Rebuild the ownership index from the links table
//! cargo run --bin admin -- index rebuild
//!
//! # Retire expired links once
//! cargo run --bin admin -- sweep
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `JWT_SECRET` (token commands): signing key shared with the server
//! - `JWT_TTL_SECONDS` (optional): token lifetime, default 1200
//! - `DATABASE_URL` (index, sweep and db commands): PostgreSQL connection string
//! - `REDIS_URL` (optional): invalidate cached redirects during `sweep`
//! - `CACHE_TTL_SECONDS` (optional): server cache TTL, default 3600

use shortener::application::services::{AuthService, LinkService, SweepService};
use shortener::config::{MAX_JWT_TTL_SECONDS, MIN_JWT_SECRET_LEN};
use shortener::infrastructure::cache::{CacheService, NullCache, RedisCache};
use shortener::infrastructure::persistence::{PgLinkRepository, PgOwnershipIndex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// CLI tool for managing the shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Ownership index maintenance
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Retire expired links once
    Sweep,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token bound to an owner id
    Issue {
        /// Owner id (a new random id if omitted)
        #[arg(short, long)]
        owner: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Replace the ownership index with one derived from the links table
    Rebuild {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Index { action } => handle_index_action(action).await?,
        Commands::Sweep => run_sweep().await?,
        Commands::Db { action } => handle_db_action(action).await?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn handle_token_action(action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Issue { owner } => issue_token(owner),
    }
}

/// Prints a freshly signed token and a usage example.
fn issue_token(owner: Option<Uuid>) -> Result<()> {
    println!("{}", "Issue bearer token".bright_blue().bold());
    println!();

    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    if secret.len() < MIN_JWT_SECRET_LEN {
        anyhow::bail!("JWT_SECRET must be at least {} bytes long", MIN_JWT_SECRET_LEN);
    }

    let ttl_seconds = std::env::var("JWT_TTL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1200);
    if ttl_seconds == 0 || ttl_seconds > MAX_JWT_TTL_SECONDS {
        anyhow::bail!("JWT_TTL_SECONDS must be between 1 and {}", MAX_JWT_TTL_SECONDS);
    }

    let owner_id = match owner {
        Some(id) => id,
        None => {
            println!("{}", "No owner given, generated a new one".yellow());
            Uuid::new_v4()
        }
    };

    let token = AuthService::new(&secret, ttl_seconds)
        .issue(owner_id)
        .context("Failed to sign token")?;

    println!();
    println!("  Owner:   {}", owner_id.to_string().cyan());
    println!("  Expires: in {}s", ttl_seconds.to_string().bright_black());
    println!("  Token:   {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/links",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

async fn handle_index_action(action: IndexAction) -> Result<()> {
    match action {
        IndexAction::Rebuild { yes } => rebuild_index(yes).await,
    }
}

/// Rebuilds the ownership index after confirmation.
async fn rebuild_index(skip_confirm: bool) -> Result<()> {
    println!("{}", "Rebuild ownership index".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Replace the ownership index with a scan of all links?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let pool = Arc::new(connect().await?);
    let service = LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgOwnershipIndex::new(pool)),
        Arc::new(NullCache::new()),
        "",
    );

    let count = service
        .rebuild_index()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to rebuild index: {}", e))?;

    println!(
        "{} {} links indexed",
        "Done:".green().bold(),
        count.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Runs a single expiry sweep, invalidating Redis entries when configured.
async fn run_sweep() -> Result<()> {
    println!("{}", "Expiry sweep".bright_blue().bold());
    println!();

    let pool = Arc::new(connect().await?);

    // Tombstones must outlive the fills the server may still be writing.
    let cache_ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    let cache: Arc<dyn CacheService> = match std::env::var("REDIS_URL") {
        Ok(url) => Arc::new(
            RedisCache::connect(&url, cache_ttl_seconds)
                .await
                .context("Failed to connect to Redis")?,
        ),
        Err(_) => Arc::new(NullCache::new()),
    };

    let service = SweepService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgOwnershipIndex::new(pool)),
        cache,
    );

    let retired = service
        .sweep_once()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "{} {} expired links retired",
        "Done:".green().bold(),
        retired.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => check_database().await,
    }
}

/// Verifies connectivity and prints link counts.
async fn check_database() -> Result<()> {
    println!("{}", "Database check".bright_blue().bold());
    println!();

    let pool = connect().await?;

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&pool)
        .await?;

    let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE deleted_at IS NULL")
        .fetch_one(&pool)
        .await?;

    let retired: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE deleted_at IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let indexed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM owner_links")
        .fetch_one(&pool)
        .await?;

    println!("  {}", "Connection OK".green().bold());
    println!("  Server:        {}", version.bright_black());
    println!("  Active links:  {}", active.to_string().bright_green().bold());
    println!("  Retired codes: {}", retired.to_string().bright_black());
    println!("  Index entries: {}", indexed.to_string().bright_white());

    if indexed != active {
        println!();
        println!(
            "  {}",
            "Index and links differ; run `admin index rebuild`".yellow()
        );
    }
    println!();

    Ok(())
}
