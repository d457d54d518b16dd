//! Application state for the store server

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Database file in the working directory, created on first start
pub const DEFAULT_DATABASE_URL: &str = "sqlite:propdash.db?mode=rwc";

pub struct AppState {
    pub db: SqlitePool,
    /// Public key every request must present in the `apikey` header
    pub api_key: String,
}

/// RFC 3339 with microseconds, so lexical order matches time order
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl AppState {
    pub async fn connect(database_url: &str, api_key: impl Into<String>) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::with_pool(pool, api_key).await
    }

    /// Private in-memory database. One connection that never expires, since
    /// every new SQLite memory connection starts empty.
    pub async fn in_memory(api_key: impl Into<String>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool, api_key).await
    }

    async fn with_pool(pool: SqlitePool, api_key: impl Into<String>) -> Result<Self> {
        Self::run_migrations(&pool).await?;
        Ok(Self {
            db: pool,
            api_key: api_key.into(),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        for statement in MIGRATIONS {
            sqlx::query(statement).execute(pool).await?;
        }

        tracing::info!("Migrations complete");
        Ok(())
    }
}

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS properties (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('occupied', 'vacant', 'maintenance')),
        rent_amount INTEGER NOT NULL CHECK (rent_amount >= 0),
        image_url TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        lease_start TEXT NOT NULL,
        lease_end TEXT NOT NULL,
        rent_amount INTEGER NOT NULL CHECK (rent_amount >= 0),
        payment_status TEXT NOT NULL DEFAULT 'pending'
            CHECK (payment_status IN ('paid', 'pending', 'overdue')),
        property_id TEXT,
        avatar_url TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS maintenance_requests (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        property_id TEXT NOT NULL,
        priority TEXT NOT NULL CHECK (priority IN ('high', 'medium', 'low')),
        status TEXT NOT NULL DEFAULT 'new'
            CHECK (status IN ('new', 'in_progress', 'completed')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_maintenance_property ON maintenance_requests(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
];
