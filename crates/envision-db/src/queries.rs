use crate::Database;
use crate::models::{CommentRow, NewUser, UserRow, format_post_date};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::ffi::{SQLITE_CONSTRAINT_FOREIGNKEY, SQLITE_CONSTRAINT_UNIQUE};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};
use tracing::debug;

/// Result of applying a like toggle for one (user, comment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
    CommentNotFound,
}

// Author plus the per-viewer derived fields. `?1` is always the viewer id.
const COMMENT_VIEW_SELECT: &str = "
    SELECT c.id, c.parent_id, c.text, c.post_date, c.user_id, u.username,
           (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id),
           EXISTS (SELECT 1 FROM likes l WHERE l.comment_id = c.id AND l.user_id = ?1),
           (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id)
    FROM comments c
    JOIN users u ON u.id = c.user_id";

impl Database {
    // -- Users --

    /// Insert a user and return its id, or `None` if the username or email
    /// is already taken.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, email, first_name, last_name, grade)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.username,
                    user.password_hash,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.grade
                ],
            );

            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_constraint(&e, SQLITE_CONSTRAINT_UNIQUE) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        parent_id: Option<i64>,
        text: &str,
        post_date: &DateTime<Utc>,
        user_id: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (parent_id, text, post_date, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![parent_id, text, format_post_date(post_date), user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Read from the writer so a caller sees its own insert immediately.
    pub fn get_comment(&self, id: i64, viewer_id: i64) -> Result<Option<CommentRow>> {
        self.with_conn_mut(|conn| query_comment(conn, id, viewer_id))
    }

    /// One page of top-level comments, newest first. `snapshot` caps the
    /// visible ids; `None` means no cap.
    pub fn get_top_level_comments(
        &self,
        viewer_id: i64,
        snapshot: Option<i64>,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_top_level(conn, viewer_id, snapshot, offset, limit))
    }

    /// Every direct reply to `parent_id`, oldest first.
    pub fn get_replies(&self, parent_id: i64, viewer_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_replies(conn, parent_id, viewer_id))
    }

    // -- Likes --

    /// Flip the like state for (user, comment).
    ///
    /// The existence check and the write share one `IMMEDIATE` transaction on
    /// the writer, so overlapping toggles are applied one after the other.
    pub fn toggle_like(&self, user_id: i64, comment_id: i64) -> Result<LikeToggle> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let liked = tx
                .query_row(
                    "SELECT 1 FROM likes WHERE user_id = ?1 AND comment_id = ?2",
                    params![user_id, comment_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            let outcome = if liked {
                tx.execute(
                    "DELETE FROM likes WHERE user_id = ?1 AND comment_id = ?2",
                    params![user_id, comment_id],
                )?;
                LikeToggle::Unliked
            } else {
                insert_like(&tx, user_id, comment_id)?
            };

            tx.commit()?;
            Ok(outcome)
        })
    }
}

/// Insert a like row. A UNIQUE violation means another writer already liked
/// the comment, which is the state the caller asked for.
fn insert_like(conn: &Connection, user_id: i64, comment_id: i64) -> Result<LikeToggle> {
    let inserted = conn.execute(
        "INSERT INTO likes (comment_id, user_id) VALUES (?1, ?2)",
        params![comment_id, user_id],
    );
    match inserted {
        Ok(_) => Ok(LikeToggle::Liked),
        Err(e) if is_constraint(&e, SQLITE_CONSTRAINT_UNIQUE) => {
            debug!(user_id, comment_id, "like already present");
            Ok(LikeToggle::Liked)
        }
        Err(e) if is_constraint(&e, SQLITE_CONSTRAINT_FOREIGNKEY) => Ok(LikeToggle::CommentNotFound),
        Err(e) => Err(e.into()),
    }
}

fn is_constraint(err: &rusqlite::Error, extended: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation && e.extended_code == extended
    )
}

fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, email, first_name, last_name, grade, created_at
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                email: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                grade: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        text: row.get(2)?,
        post_date: row.get(3)?,
        user_id: row.get(4)?,
        username: row.get(5)?,
        count_likes: row.get(6)?,
        user_liked: row.get(7)?,
        count_replies: row.get(8)?,
    })
}

fn query_comment(conn: &Connection, id: i64, viewer_id: i64) -> Result<Option<CommentRow>> {
    let sql = format!("{COMMENT_VIEW_SELECT} WHERE c.id = ?2");
    let row = conn
        .query_row(&sql, params![viewer_id, id], comment_from_row)
        .optional()?;
    Ok(row)
}

fn query_top_level(
    conn: &Connection,
    viewer_id: i64,
    snapshot: Option<i64>,
    offset: u32,
    limit: u32,
) -> Result<Vec<CommentRow>> {
    let sql = format!(
        "{COMMENT_VIEW_SELECT}
         WHERE c.parent_id IS NULL AND (?2 IS NULL OR c.id <= ?2)
         ORDER BY c.post_date DESC, c.id DESC
         LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params![viewer_id, snapshot, limit, offset], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_replies(conn: &Connection, parent_id: i64, viewer_id: i64) -> Result<Vec<CommentRow>> {
    let sql = format!(
        "{COMMENT_VIEW_SELECT}
         WHERE c.parent_id = ?2
         ORDER BY c.post_date ASC, c.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params![viewer_id, parent_id], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
