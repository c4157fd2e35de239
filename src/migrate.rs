use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the `entries` table, its FTS5 index and the sync triggers.
///
/// `id` is an explicit `INTEGER PRIMARY KEY` so `VACUUM` keeps the rowids the
/// external-content FTS table points at. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY,
            uri TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            src TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            keywords TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_name ON entries(name)")
        .execute(pool)
        .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='entries_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        // Column order fixes the bm25 weight order: name, description, keywords, body.
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE entries_fts USING fts5(
                name,
                description,
                keywords,
                body,
                content='entries',
                content_rowid='id'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS entries_ai AFTER INSERT ON entries BEGIN
            INSERT INTO entries_fts(rowid, name, description, keywords, body)
            VALUES (new.id, new.name, new.description, new.keywords, new.body);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS entries_ad AFTER DELETE ON entries BEGIN
            INSERT INTO entries_fts(entries_fts, rowid, name, description, keywords, body)
            VALUES ('delete', old.id, old.name, old.description, old.keywords, old.body);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS entries_au AFTER UPDATE ON entries BEGIN
            INSERT INTO entries_fts(entries_fts, rowid, name, description, keywords, body)
            VALUES ('delete', old.id, old.name, old.description, old.keywords, old.body);
            INSERT INTO entries_fts(rowid, name, description, keywords, body)
            VALUES (new.id, new.name, new.description, new.keywords, new.body);
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
