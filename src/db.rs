use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

const DEFAULT_DB_PATH: &str = "website/db/claimdesk.db";

/// Open the pool at `CLAIMDESK_DB`, or the default path under `website/db`.
pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let path = std::env::var("CLAIMDESK_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    init_pool_at(&path)
}

pub fn init_pool_at(path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    // WAL keeps dashboard reads from blocking form submissions
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    log::info!("Database opened at {}", path);
    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Contact form submissions
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            subject TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            is_read INTEGER NOT NULL DEFAULT 0
        );

        -- Consultation requests
        CREATE TABLE IF NOT EXISTS consultations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            practice_name TEXT NOT NULL DEFAULT '',
            specialty TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            is_read INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending'
        );

        -- Call-to-action inquiries
        CREATE TABLE IF NOT EXISTS cta_inquiries (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            practice_name TEXT NOT NULL DEFAULT '',
            monthly_collection TEXT NOT NULL DEFAULT '',
            total_ar TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            is_read INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending'
        );

        -- Article comments
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            post_slug TEXT NOT NULL,
            author_name TEXT NOT NULL,
            author_email TEXT NOT NULL DEFAULT '',
            author_website TEXT NOT NULL DEFAULT '',
            comment TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            is_read INTEGER NOT NULL DEFAULT 0
        );

        -- Newsletter
        CREATE TABLE IF NOT EXISTS subscribers (
            id INTEGER PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            subscribed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        -- Blog posts; content is a JSON array of content blocks
        CREATE TABLE IF NOT EXISTS blog_posts (
            id INTEGER PRIMARY KEY,
            slug TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL DEFAULT '',
            author_name TEXT NOT NULL DEFAULT '',
            featured_image TEXT NOT NULL DEFAULT '',
            read_time TEXT NOT NULL DEFAULT '',
            featured INTEGER NOT NULL DEFAULT 0,
            is_published INTEGER NOT NULL DEFAULT 0,
            tags_json TEXT NOT NULL DEFAULT '[]',
            content_json TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_hash TEXT,
            user_agent TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_created ON contacts(created_at);
        CREATE INDEX IF NOT EXISTS idx_consultations_created ON consultations(created_at);
        CREATE INDEX IF NOT EXISTS idx_cta_created ON cta_inquiries(created_at);
        CREATE INDEX IF NOT EXISTS idx_comments_slug ON comments(post_slug);
        CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "ClaimDesk Medical Billing"),
        ("site_url", "http://localhost:8000"),
        ("site_description", "Medical billing and revenue cycle management"),
        ("admin_email", ""),
        // Security
        ("session_expiry_hours", "8"),
        ("login_rate_limit", "5"),
        // Public forms
        ("comments_enabled", "true"),
        ("comments_rate_limit", "5"),
        ("forms_rate_limit", "10"),
        // Uploads
        ("uploads_path", "website/uploads/"),
        ("uploads_url_prefix", "/uploads/"),
        ("uploads_max_mb", "5"),
        ("uploads_allowed_types", "image/jpeg,image/png,image/gif,image/webp"),
        // Dashboard
        ("dashboard_history_start", crate::models::settings::DEFAULT_HISTORY_START),
        // Feed
        ("rss_feed_count", "25"),
        // Background tasks (minutes)
        ("task_session_cleanup_interval", "30"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed admin password if not set
    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        // Default password: "admin" until changed
        let hash = bcrypt::hash("admin", bcrypt::DEFAULT_COST)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
        log::warn!("Admin password initialised to the default; change it before going live");
    }

    Ok(())
}
