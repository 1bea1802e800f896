//! Database schema migrations
//!
//! Versioned schema migrations so existing databases upgrade in place
//! instead of being dropped and recreated.
//!
//! # Migration guidelines
//!
//! 1. Never modify existing migrations; add a new one for each change
//! 2. Migrations must be idempotent (safe to run multiple times)
//! 3. Prefer rebuild-and-copy over DROP to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: ensure the composite natural key on vehicles.
///
/// Early databases were created without `UNIQUE(identitet, chassinummer)`.
/// Rebuild the table and copy rows across instead of dropping it; on key
/// collisions the first row wins (`INSERT OR IGNORE`).
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let table_sql: Option<String> = sqlx::query_scalar(
        "SELECT sql FROM sqlite_master WHERE type='table' AND name='vehicles'",
    )
    .fetch_optional(pool)
    .await?;

    let Some(table_sql) = table_sql else {
        // Fresh database, table will be created with the current shape
        return Ok(());
    };

    if table_sql.contains("UNIQUE(identitet, chassinummer)") {
        return Ok(());
    }

    info!("Migration v1: rebuilding vehicles table with composite unique key");

    sqlx::query(
        r#"
        CREATE TABLE vehicles_migrated (
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

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO vehicles_migrated (
            raw_line, identitet, chassinummer, modellar, typgodkannande_nr,
            forsta_registrering, privatimporterad, avregistrerad_datum, farg,
            senast_besiktning, nasta_besiktning, senast_registrering,
            manadsregistrering, created_at, updated_at
        )
        SELECT
            raw_line, identitet, chassinummer, modellar, typgodkannande_nr,
            forsta_registrering, privatimporterad, avregistrerad_datum, farg,
            senast_besiktning, nasta_besiktning, senast_registrering,
            manadsregistrering, created_at, updated_at
        FROM vehicles
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("DROP TABLE vehicles").execute(pool).await?;
    sqlx::query("ALTER TABLE vehicles_migrated RENAME TO vehicles")
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

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulates a database created before the composite unique key existed
    async fn create_legacy_vehicles_table(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TABLE vehicles (
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
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_migrate_v1_preserves_rows() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_legacy_vehicles_table(&pool).await;

        sqlx::query("INSERT INTO vehicles (raw_line, identitet, chassinummer) VALUES (?, ?, ?)")
            .bind("old-line")
            .bind("GHI789")
            .bind("WVWZZZ1JZXW000001")
            .execute(&pool)
            .await
            .unwrap();

        crate::db::create_schema(&pool).await.unwrap();

        let (identitet, raw_line): (String, String) =
            sqlx::query_as("SELECT identitet, raw_line FROM vehicles")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(identitet, "GHI789");
        assert_eq!(raw_line, "old-line");

        // Rebuilt table now carries the composite unique key
        let sql: String = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type='table' AND name='vehicles'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(sql.contains("UNIQUE(identitet, chassinummer)"));
    }

    #[tokio::test]
    async fn test_migrate_v1_collapses_duplicate_keys() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_legacy_vehicles_table(&pool).await;

        for line in ["first", "second"] {
            sqlx::query(
                "INSERT INTO vehicles (raw_line, identitet, chassinummer) VALUES (?, ?, ?)",
            )
            .bind(line)
            .bind("DUP001")
            .bind("WVWZZZ1JZXW000002")
            .execute(&pool)
            .await
            .unwrap();
        }

        crate::db::create_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        // First row wins
        let raw_line: String = sqlx::query_scalar("SELECT raw_line FROM vehicles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(raw_line, "first");
    }

    #[tokio::test]
    async fn test_migrations_record_version() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::create_schema(&pool).await.unwrap();

        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }
}
