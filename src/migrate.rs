use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the catalog tables on an open pool. Idempotent.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Namespace prefixes of the catalog graph
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_namespaces (
            prefix TEXT PRIMARY KEY,
            iri TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per statement of the catalog graph
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_statements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_kind TEXT NOT NULL,
            subject TEXT NOT NULL,
            predicate TEXT NOT NULL,
            object_kind TEXT NOT NULL,
            object TEXT NOT NULL,
            lang TEXT,
            datatype TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Bookkeeping of writes
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_writes (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            statements INTEGER NOT NULL,
            written_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_catalog_statements_subject ON catalog_statements(subject)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
