//! Handler for link creation.

use axum::{Extension, Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{BatchSummary, ShortenRequest, ShortenResponse, ShortenResultItem};
use crate::api::middleware::auth::AuthenticatedOwner;
use crate::error::AppError;
use crate::state::AppState;

/// Creates short links for one or more target URLs.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Batch Processing
///
/// Each URL is allocated independently. A failing item carries its
/// machine-readable error and does not affect the others. Submitting the same
/// URL twice yields two distinct codes.
///
/// # Request Body
///
/// ```json
/// {
///   "urls": [
///     { "url": "https://example.com/a" },
///     { "url": "https://example.com/b", "expires_at": "2030-01-01T00:00:00Z" }
///   ]
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the request body fails validation.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedOwner(owner_id)): Extension<AuthenticatedOwner>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let total = payload.urls.len();
    let mut items = Vec::with_capacity(total);
    let mut successful = 0;

    for item in payload.urls {
        match state
            .allocator
            .allocate_with_expiry(owner_id, &item.url, item.expires_at)
            .await
        {
            Ok(link) => {
                successful += 1;
                items.push(ShortenResultItem::Success {
                    short_url: state.link_service.short_url(&link.code),
                    long_url: link.target_url,
                    code: link.code,
                    expires_at: link.expires_at,
                });
            }
            Err(err) => {
                let err = AppError::from(err);
                items.push(ShortenResultItem::Error {
                    long_url: item.url,
                    error: err.to_error_info(),
                });
            }
        }
    }

    Ok(Json(ShortenResponse {
        summary: BatchSummary {
            total,
            successful,
            failed: total - successful,
        },
        items,
    }))
}
