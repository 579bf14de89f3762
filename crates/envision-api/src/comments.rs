use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::PathRejection},
};
use serde::Deserialize;

use envision_types::api::{Claims, CommentView, CreateCommentRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Raw listing parameters. Values that are not plain non-negative integers
/// are ignored and the default applies.
#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub offset: Option<String>,
    pub snapshot: Option<String>,
}

impl CommentQuery {
    /// Digit strings past `u32::MAX` saturate, which yields an empty page.
    pub fn offset(&self) -> u32 {
        match self.offset.as_deref() {
            Some(raw) if is_plain_int(raw) => raw.parse().unwrap_or(u32::MAX),
            _ => 0,
        }
    }

    /// `None` means the listing is not capped by id.
    pub fn snapshot(&self) -> Option<i64> {
        plain_int(self.snapshot.as_deref())
    }
}

fn is_plain_int(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn plain_int<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.filter(|s| is_plain_int(s)).and_then(|s| s.parse().ok())
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<CommentView>, ApiError> {
    let Json(req) = body?;

    let view = blocking(move || {
        state
            .comments
            .create_comment(claims.sub, req.parent_id, &req.text, &req.post_date)
    })
    .await?;

    Ok(Json(view))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let offset = query.offset();
    let snapshot = query.snapshot();

    let views = blocking(move || {
        state
            .comments
            .list_top_level(claims.sub, offset, snapshot)
    })
    .await?;

    Ok(Json(views))
}

pub async fn list_replies(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    comment_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let Path(comment_id) = comment_id?;

    let views = blocking(move || state.comments.list_replies(claims.sub, comment_id)).await?;

    Ok(Json(views))
}
