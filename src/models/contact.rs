use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

const TABLE: &str = "contacts";

/// A message sent through the public contact form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub created_at: Option<NaiveDateTime>,
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub honeypot: Option<String>,
}

impl Contact {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Contact {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            subject: row.get("subject")?,
            message: row.get("message")?,
            created_at: super::timestamp_column(row, "created_at")?,
            is_read: row.get("is_read")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM contacts WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    /// All contacts in insertion order.
    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM contacts ORDER BY id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ContactForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO contacts (name, email, phone, subject, message) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                form.name.trim(),
                form.email.trim(),
                super::text(&form.phone),
                super::text(&form.subject),
                form.message.trim(),
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
