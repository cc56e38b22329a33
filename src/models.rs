pub mod comment;
pub mod consultation;
pub mod contact;
pub mod cta_inquiry;
pub mod post;
pub mod settings;
pub mod subscriber;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::db::DbPool;

/// Parse a stored timestamp. Accepts SQLite's `CURRENT_TIMESTAMP` format, ISO
/// 8601 with or without fractional seconds, RFC 3339 and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Read a timestamp column without failing the whole row on bad data.
pub(crate) fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(column)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Follow-up state of a consultation request or CTA inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Pending,
    Contacted,
    Scheduled,
    Completed,
    Cancelled,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Scheduled => "scheduled",
            LeadStatus::Completed => "completed",
            LeadStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LeadStatus::Pending),
            "contacted" => Ok(LeadStatus::Contacted),
            "scheduled" => Ok(LeadStatus::Scheduled),
            "completed" => Ok(LeadStatus::Completed),
            "cancelled" | "canceled" => Ok(LeadStatus::Cancelled),
            other => Err(format!("Unknown status '{}'", other)),
        }
    }
}

/// Flag a row as read. Returns false when no row has that id.
/// `table` is always one of the fixed table names in this module tree.
pub(crate) fn mark_read(pool: &DbPool, table: &str, id: i64) -> Result<bool, String> {
    let conn = pool.get().map_err(|e| e.to_string())?;
    let changed = conn
        .execute(&format!("UPDATE {} SET is_read = 1 WHERE id = ?1", table), params![id])
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

pub(crate) fn update_status(pool: &DbPool, table: &str, id: i64, status: LeadStatus) -> Result<bool, String> {
    let conn = pool.get().map_err(|e| e.to_string())?;
    let changed = conn
        .execute(
            &format!("UPDATE {} SET status = ?1 WHERE id = ?2", table),
            params![status.as_str(), id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

pub(crate) fn delete_row(pool: &DbPool, table: &str, id: i64) -> Result<bool, String> {
    let conn = pool.get().map_err(|e| e.to_string())?;
    let changed = conn
        .execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

/// Treat absent optional form fields as empty strings.
pub(crate) fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}
