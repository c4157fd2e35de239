//! Index statistics.
//!
//! A quick summary of what's indexed: entry count, database size and a
//! per-`src` breakdown. Used by `helpsearch stats` to check that a build run
//! loaded what was expected.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Entry count for one `src` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub src: String,
    pub entries: i64,
}

pub async fn source_breakdown(pool: &SqlitePool) -> Result<Vec<SourceStats>> {
    let rows = sqlx::query(
        r#"
        SELECT src, COUNT(*) AS entries
        FROM entries
        GROUP BY src
        ORDER BY entries DESC, src
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| SourceStats {
            src: row.get("src"),
            entries: row.get("entries"),
        })
        .collect())
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total = db::count_entries(&pool).await?;
    let breakdown = source_breakdown(&pool).await?;
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("helpsearch index stats");
    println!("======================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Entries:     {}", total);

    if !breakdown.is_empty() {
        println!();
        println!("  By src:");
        println!("  {:<24} {:>8}", "SRC", "ENTRIES");
        println!("  {}", "-".repeat(33));
        for s in &breakdown {
            let src = if s.src.is_empty() { "(none)" } else { &s.src };
            println!("  {:<24} {:>8}", src, s.entries);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
