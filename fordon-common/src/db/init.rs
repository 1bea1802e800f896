//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies connection pragmas and
//! brings the schema up to the current version. Safe to call on every
//! startup; all steps are idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers while an upload is writing
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes, then run pending migrations.
///
/// Exposed separately so tests can build the schema on an in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_vehicles_table(pool).await?;

    super::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Vehicle registry table, one row per (identitet, chassinummer) pair.
///
/// `raw_line` holds the untouched source line and doubles as the
/// change-detection fingerprint during reconciliation.
pub async fn create_vehicles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            raw_line TEXT NOT NULL,
            identitet TEXT NOT NULL,
            chassinummer TEXT NOT NULL,
            modellar INTEGER,
            typgodkannande_nr TEXT,
            forsta_registrering TEXT,
            privatimporterad INTEGER,
            avregistrerad_datum TEXT,
            farg TEXT,
            senast_besiktning TEXT,
            nasta_besiktning TEXT,
            senast_registrering TEXT,
            manadsregistrering TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(identitet, chassinummer)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vehicles_identitet ON vehicles(identitet)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vehicles_chassinummer ON vehicles(chassinummer)")
        .execute(pool)
        .await?;

    Ok(())
}
