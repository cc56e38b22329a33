use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::LeadStatus;
use crate::db::DbPool;

const TABLE: &str = "consultations";

/// A free-consultation request from a practice.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Consultation {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub practice_name: String,
    pub specialty: String,
    pub message: String,
    pub created_at: Option<NaiveDateTime>,
    pub is_read: bool,
    pub status: LeadStatus,
}

#[derive(Debug, Deserialize)]
pub struct ConsultationForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub practice_name: Option<String>,
    pub specialty: Option<String>,
    pub message: Option<String>,
    pub honeypot: Option<String>,
}

impl Consultation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Consultation {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            practice_name: row.get("practice_name")?,
            specialty: row.get("specialty")?,
            message: row.get("message")?,
            created_at: super::timestamp_column(row, "created_at")?,
            is_read: row.get("is_read")?,
            status: status.parse().unwrap_or_default(),
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM consultations WHERE id = ?1",
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
        let mut stmt = match conn.prepare("SELECT * FROM consultations ORDER BY id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ConsultationForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO consultations (name, email, phone, practice_name, specialty, message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.name.trim(),
                form.email.trim(),
                super::text(&form.phone),
                super::text(&form.practice_name),
                super::text(&form.specialty),
                super::text(&form.message),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn mark_read(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::mark_read(pool, TABLE, id)
    }

    pub fn update_status(pool: &DbPool, id: i64, status: LeadStatus) -> Result<bool, String> {
        super::update_status(pool, TABLE, id, status)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        super::delete_row(pool, TABLE, id)
    }
}
