//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Reject codes outside the alphabet/length policy
/// 2. Check cache (expiry is evaluated on cached entries too)
/// 3. On cache miss, read the mapping store and fill the cache in the background
/// 4. Return 307 Temporary Redirect with the exact stored target
///
/// # Errors
///
/// - 404 Not Found if the code never existed or was deleted
/// - 410 Gone if the link has expired
/// - 503 Service Unavailable if the store cannot be read
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let target_url = state.resolver.resolve(&code).await?;

    Ok(Redirect::temporary(&target_url))
}
