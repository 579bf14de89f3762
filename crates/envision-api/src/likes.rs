use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};

use envision_types::api::{Claims, MessageResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Like or un-like a comment for the caller. Always answers `{"message": "OK"}`
/// on success; the new state is visible on the next read.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    comment_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(comment_id) = comment_id?;

    blocking(move || state.comments.toggle_like(claims.sub, comment_id)).await?;

    Ok(Json(MessageResponse::ok()))
}
