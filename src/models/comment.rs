use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

const TABLE: &str = "comments";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_slug: String,
    pub author_name: String,
    pub author_email: String,
    pub author_website: String,
    pub comment: String,
    pub created_at: Option<NaiveDateTime>,
    pub is_read: bool,
}

/// Public-facing shape: no email address.
#[derive(Debug, Serialize, Clone)]
pub struct PublicComment {
    pub id: i64,
    pub author_name: String,
    pub author_website: String,
    pub comment: String,
    pub created_at: Option<NaiveDateTime>,
}

/// Body of the article comment form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentForm {
    pub post_slug: String,
    pub author_name: String,
    pub author_email: String,
    pub author_website: Option<String>,
    pub comment: String,
    pub article_title: Option<String>,
    pub honeypot: Option<String>,
}

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get("id")?,
            post_slug: row.get("post_slug")?,
            author_name: row.get("author_name")?,
            author_email: row.get("author_email")?,
            author_website: row.get("author_website")?,
            comment: row.get("comment")?,
            created_at: super::timestamp_column(row, "created_at")?,
            is_read: row.get("is_read")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM comments ORDER BY id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Comments shown under an article, oldest first.
    pub fn for_post(pool: &DbPool, post_slug: &str) -> Vec<PublicComment> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM comments WHERE post_slug = ?1 ORDER BY created_at ASC, id ASC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![post_slug], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).map(Comment::into_public).collect())
            .unwrap_or_default()
    }

    pub fn into_public(self) -> PublicComment {
        PublicComment {
            id: self.id,
            author_name: self.author_name,
            author_website: self.author_website,
            comment: self.comment,
            created_at: self.created_at,
        }
    }

    pub fn create(pool: &DbPool, form: &CommentForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO comments (post_slug, author_name, author_email, author_website, comment)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                form.post_slug.trim(),
                form.author_name.trim(),
                form.author_email.trim(),
                super::text(&form.author_website),
                form.comment.trim(),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn mark_read(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::mark_read(pool, TABLE, id)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::delete_row(pool, TABLE, id)
    }
}
