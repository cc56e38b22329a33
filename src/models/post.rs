use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::content::block::ContentBlock;
use crate::content::editor::BlogPostDraft;
use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    /// Display date chosen in the editor, e.g. "March 5, 2024".
    pub date: String,
    pub author_name: String,
    pub featured_image: String,
    pub read_time: String,
    pub featured: bool,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub content: Vec<ContentBlock>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl BlogPost {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let content_json: String = row.get("content_json")?;
        let tags_json: String = row.get("tags_json")?;
        // Unreadable stored content degrades to an empty body rather than a missing post.
        let mut content: Vec<ContentBlock> = serde_json::from_str(&content_json).unwrap_or_default();
        content.iter_mut().for_each(ContentBlock::normalize);
        Ok(BlogPost {
            id: row.get("id")?,
            slug: row.get("slug")?,
            title: row.get("title")?,
            excerpt: row.get("excerpt")?,
            category: row.get("category")?,
            date: row.get("date")?,
            author_name: row.get("author_name")?,
            featured_image: row.get("featured_image")?,
            read_time: row.get("read_time")?,
            featured: row.get("featured")?,
            is_published: row.get("is_published")?,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            content,
            created_at: super::timestamp_column(row, "created_at")?,
            updated_at: super::timestamp_column(row, "updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM blog_posts WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM blog_posts WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_published(pool: &DbPool, slug: &str) -> Option<Self> {
        Self::find_by_slug(pool, slug).filter(|p| p.is_published)
    }

    /// Every post, drafts included, in insertion order.
    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM blog_posts ORDER BY id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Published posts, featured first, then newest first.
    pub fn published(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM blog_posts WHERE is_published = 1
             ORDER BY featured DESC, created_at DESC, id DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Persist a draft that has already been through `BlogPostDraft::prepare`.
    pub fn create(pool: &DbPool, draft: &BlogPostDraft) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let content_json = serde_json::to_string(&draft.content).map_err(|e| e.to_string())?;
        let tags_json = serde_json::to_string(&draft.tags).map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO blog_posts
                (slug, title, excerpt, category, date, author_name, featured_image, read_time,
                 featured, is_published, tags_json, content_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                draft.slug,
                draft.title,
                draft.excerpt,
                draft.category,
                draft.date,
                draft.author_name,
                draft.featured_image,
                draft.read_time,
                draft.featured,
                draft.is_published,
                tags_json,
                content_json,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, draft: &BlogPostDraft) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let content_json = serde_json::to_string(&draft.content).map_err(|e| e.to_string())?;
        let tags_json = serde_json::to_string(&draft.tags).map_err(|e| e.to_string())?;
        let changed = conn
            .execute(
                "UPDATE blog_posts SET
                    slug = ?1, title = ?2, excerpt = ?3, category = ?4, date = ?5,
                    author_name = ?6, featured_image = ?7, read_time = ?8, featured = ?9,
                    is_published = ?10, tags_json = ?11, content_json = ?12,
                    updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?13",
                params![
                    draft.slug,
                    draft.title,
                    draft.excerpt,
                    draft.category,
                    draft.date,
                    draft.author_name,
                    draft.featured_image,
                    draft.read_time,
                    draft.featured,
                    draft.is_published,
                    tags_json,
                    content_json,
                    id,
                ],
            )
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::delete_row(pool, "blog_posts", id)
    }
}
