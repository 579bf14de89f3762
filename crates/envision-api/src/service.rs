//! Comment aggregation: creating comments and replies, toggling likes, and
//! building the per-viewer [`CommentView`] projection.
//!
//! Threads are two levels deep. A top-level comment has no parent, a reply
//! points at a top-level comment, and replies cannot be replied to.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{debug, warn};

use envision_db::models::CommentRow;
use envision_db::{Database, LikeToggle};
use envision_types::api::{CommentView, UserSummary};

use crate::error::ApiError;

/// Top-level comments returned per page.
pub const PAGE_SIZE: u32 = 10;

/// Comment text must be strictly shorter than this many characters.
pub const MAX_TEXT_CHARS: usize = 200;

pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_comment(
        &self,
        user_id: i64,
        parent_id: Option<i64>,
        text: &str,
        post_date: &str,
    ) -> Result<CommentView, ApiError> {
        if text.chars().count() >= MAX_TEXT_CHARS {
            return Err(ApiError::Validation("Text too long".into()));
        }
        let post_date = parse_post_date(post_date)?;

        // Comments are never deleted, so a parent seen as top-level here
        // is still top-level when the insert lands.
        if let Some(pid) = parent_id {
            let parent = self
                .db
                .get_comment(pid, user_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Comment {pid} not found")))?;
            if parent.parent_id.is_some() {
                return Err(ApiError::Validation("Replies cannot be replied to".into()));
            }
        }

        let id = self.db.insert_comment(parent_id, text, &post_date, user_id)?;
        debug!(comment_id = id, user_id, ?parent_id, "created comment");

        let row = self
            .db
            .get_comment(id, user_id)?
            .ok_or_else(|| anyhow::anyhow!("comment {} vanished after insert", id))?;
        Ok(to_view(row))
    }

    /// Page of top-level comments, newest first. Only ids `<= snapshot` are
    /// visible so a client can page through a stable set.
    pub fn list_top_level(
        &self,
        user_id: i64,
        offset: u32,
        snapshot: Option<i64>,
    ) -> Result<Vec<CommentView>, ApiError> {
        let rows = self
            .db
            .get_top_level_comments(user_id, snapshot, offset, PAGE_SIZE)?;
        Ok(rows.into_iter().map(to_view).collect())
    }

    /// All replies to `parent_id`, oldest first. Unknown parents yield an empty list.
    pub fn list_replies(&self, user_id: i64, parent_id: i64) -> Result<Vec<CommentView>, ApiError> {
        let rows = self.db.get_replies(parent_id, user_id)?;
        Ok(rows.into_iter().map(to_view).collect())
    }

    /// Flip the caller's like on a comment. The resulting state is not
    /// reported; clients re-fetch the comment to see it.
    pub fn toggle_like(&self, user_id: i64, comment_id: i64) -> Result<(), ApiError> {
        match self.db.toggle_like(user_id, comment_id)? {
            LikeToggle::CommentNotFound => Err(ApiError::NotFound(format!(
                "Comment {comment_id} not found"
            ))),
            outcome => {
                debug!(comment_id, user_id, ?outcome, "toggled like");
                Ok(())
            }
        }
    }
}

/// Parse a client timestamp. Accepts RFC 3339 with an offset, or a naive
/// date-time / date which is taken to be UTC.
pub fn parse_post_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN).and_utc()))
        .map_err(|_| ApiError::Validation(format!("Invalid postDate: {raw}")))
}

fn to_view(row: CommentRow) -> CommentView {
    let post_date = DateTime::parse_from_rfc3339(&row.post_date)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt post_date '{}' on comment {}: {}", row.post_date, row.id, e);
            DateTime::default()
        });

    CommentView {
        id: row.id,
        text: row.text,
        post_date,
        count_likes: u64::try_from(row.count_likes).unwrap_or_default(),
        user_liked: row.user_liked,
        count_replies: u64::try_from(row.count_replies).unwrap_or_default(),
        parent_id: row.parent_id,
        user: UserSummary {
            id: row.user_id,
            username: row.username,
        },
    }
}
