use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Newsletter subscriber. Subscribers have no read state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub subscribed_at: Option<NaiveDateTime>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

impl Subscriber {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscriber {
            id: row.get("id")?,
            email: row.get("email")?,
            subscribed_at: super::timestamp_column(row, "subscribed_at")?,
            is_active: row.get("is_active")?,
        })
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM subscribers ORDER BY id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Subscribe an address, reactivating it if it unsubscribed before.
    /// The original `subscribed_at` is kept on reactivation.
    pub fn subscribe(pool: &DbPool, email: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let email = email.trim().to_lowercase();
        conn.execute(
            "INSERT INTO subscribers (email) VALUES (?1)
             ON CONFLICT(email) DO UPDATE SET is_active = 1",
            params![email],
        )
        .map_err(|e| e.to_string())?;
        conn.query_row(
            "SELECT id FROM subscribers WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .map_err(|e| e.to_string())
    }

    pub fn unsubscribe(pool: &DbPool, email: &str) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute(
                "UPDATE subscribers SET is_active = 0 WHERE email = ?1",
                params![email.trim().to_lowercase()],
            )
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::delete_row(pool, "subscribers", id)
    }
}
