//! Database row types. These map directly to SQLite rows and stay
//! independent of the envision-types wire models.

use chrono::{DateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub grade: i64,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub grade: i64,
}

/// A comment joined with its author and the counts derived for one viewer.
pub struct CommentRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub text: String,
    pub post_date: String,
    pub user_id: i64,
    pub username: String,
    pub count_likes: i64,
    pub user_liked: bool,
    pub count_replies: i64,
}

/// Fixed-width UTC form used for `comments.post_date`, so that text
/// ordering in SQL matches chronological ordering.
pub fn format_post_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
