//! Handlers for an owner's link management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::links::{LinkItem, LinkListResponse};
use crate::api::middleware::auth::AuthenticatedOwner;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's active links in creation order.
///
/// # Endpoint
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedOwner(owner_id)): Extension<AuthenticatedOwner>,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state.link_service.list_links(owner_id).await?;

    let items: Vec<LinkItem> = links
        .into_iter()
        .map(|link| LinkItem {
            short_url: state.link_service.short_url(&link.code),
            code: link.code,
            target_url: link.target_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
        })
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// The code is retired: it resolves to 404 from now on and is never handed
/// out again.
///
/// # Errors
///
/// Returns 404 Not Found if the code does not exist or belongs to another owner.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(AuthenticatedOwner(owner_id)): Extension<AuthenticatedOwner>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(owner_id, &code).await?;

    Ok(StatusCode::NO_CONTENT)
}
