use chrono::NaiveDate;
use rusqlite::params;

use crate::db::DbPool;

/// Fallback lower bound for the "all time" dashboard range when no record
/// carries a timestamp.
pub const DEFAULT_HISTORY_START: &str = "2024-01-01";

/// Key/value site configuration stored in the `settings` table.
pub struct Setting;

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    pub fn get_or(pool: &DbPool, key: &str, default: &str) -> String {
        Self::get(pool, key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(pool: &DbPool, key: &str) -> bool {
        Self::get(pool, key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }

    /// Integer setting, or `default` when missing or unparseable.
    pub fn get_i64_or(pool: &DbPool, key: &str, default: i64) -> i64 {
        Self::get(pool, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Configured fallback start of product history for the "all" preset.
    pub fn history_start(pool: &DbPool) -> NaiveDate {
        let raw = Self::get_or(pool, "dashboard_history_start", DEFAULT_HISTORY_START);
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
            log::warn!("Invalid dashboard_history_start '{}', using {}", raw, DEFAULT_HISTORY_START);
            default_history_start()
        })
    }

    /// Admin session lifetime in hours, at least one.
    pub fn session_expiry_hours(pool: &DbPool) -> i64 {
        Self::get_i64_or(pool, "session_expiry_hours", 8).max(1)
    }
}

pub fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}
