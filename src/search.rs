//! Two-phase ranked search.
//!
//! 1. **Exact name**: entries whose `name` equals the query (cut to
//!    `name_max_chars`), up to `exact_limit`, in insertion order.
//! 2. **Ranked**: entries matching every term as a prefix, minus the exact
//!    name from phase 1, ordered by exact-term rank then prefix rank, up to
//!    `ranked_limit`.
//!
//! Phase 1 results always come first. Ranks are FTS5 `bm25` scores with
//! column weights name > description > keywords > body, negated so that
//! higher is better. Entries without an exact-term match rank 0 there.

use sqlx::{Row, SqlitePool};

use crate::config::{Config, SearchConfig};
use crate::db;
use crate::models::SearchHit;
use crate::query::{QueryBuilder, QueryExpression};

const EXACT_NAME_SQL: &str = r#"
    SELECT uri, name, src, description
    FROM entries
    WHERE name = ?
    ORDER BY id
    LIMIT ?
"#;

const RANKED_SQL: &str = r#"
    WITH startswith AS MATERIALIZED (
        SELECT rowid, bm25(entries_fts, 1.0, 0.4, 0.2, 0.1) AS score
        FROM entries_fts
        WHERE entries_fts MATCH ?
    ),
    exact AS MATERIALIZED (
        SELECT rowid, bm25(entries_fts, 1.0, 0.4, 0.2, 0.1) AS score
        FROM entries_fts
        WHERE entries_fts MATCH ?
    )
    SELECT e.uri, e.name, e.src, e.description,
           -COALESCE(x.score, 0.0) AS r_exact,
           -s.score AS r_startswith
    FROM startswith s
    JOIN entries e ON e.id = s.rowid
    LEFT JOIN exact x ON x.rowid = s.rowid
    WHERE e.name IS NOT ?
    ORDER BY r_exact DESC, r_startswith DESC, e.id
    LIMIT ?
"#;

pub struct SearchExecutor {
    pool: SqlitePool,
    builder: QueryBuilder,
    settings: SearchConfig,
}

impl SearchExecutor {
    pub fn new(pool: SqlitePool, settings: SearchConfig) -> Self {
        Self {
            pool,
            builder: QueryBuilder::new(),
            settings,
        }
    }

    /// Search for `raw`. An empty query returns no results without touching
    /// the store.
    pub async fn search(&self, raw: &str) -> Result<Vec<SearchHit>, sqlx::Error> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let name = truncate_chars(raw, self.settings.name_max_chars);
        let mut hits = self.exact_name_matches(name).await?;
        let exclude = (!hits.is_empty()).then(|| name.to_string());

        let expr = self.builder.build(raw, exclude);
        hits.extend(self.ranked_matches(&expr).await?);

        for hit in &mut hits {
            hit.description =
                truncate_description(&hit.description, self.settings.description_max_chars);
        }
        Ok(hits)
    }

    async fn exact_name_matches(&self, name: &str) -> Result<Vec<SearchHit>, sqlx::Error> {
        if self.settings.exact_limit == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(EXACT_NAME_SQL)
            .bind(name)
            .bind(self.settings.exact_limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(hit_from_row).collect())
    }

    async fn ranked_matches(&self, expr: &QueryExpression) -> Result<Vec<SearchHit>, sqlx::Error> {
        if expr.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(RANKED_SQL)
            .bind(&expr.prefix)
            .bind(&expr.exact)
            .bind(&expr.exclude)
            .bind(self.settings.ranked_limit)
            .fetch_all(&self.pool)
            .await;

        match rows {
            Ok(rows) => Ok(rows.iter().map(hit_from_row).collect()),
            // FTS5 rejects some expressions (e.g. a term with no indexable
            // characters); that is a query with no results, not a failure.
            Err(sqlx::Error::Database(e)) => {
                tracing::warn!(prefix = %expr.prefix, error = %e, "ranked search rejected");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

fn hit_from_row(row: &sqlx::sqlite::SqliteRow) -> SearchHit {
    SearchHit {
        uri: row.get("uri"),
        name: row.get("name"),
        src: row.get("src"),
        description: row.get("description"),
    }
}

/// First `max` characters of `s`.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Cut `description` to `max` characters, ending in `...` when shortened.
pub fn truncate_description(description: &str, max: usize) -> String {
    if description.chars().count() <= max {
        return description.to_string();
    }
    let keep = max.saturating_sub(3);
    format!("{}...", truncate_chars(description, keep))
}

/// `helpsearch search`: run a query and print the merged results.
pub async fn run_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let executor = SearchExecutor::new(pool.clone(), config.search.clone());
    let hits = executor.search(query).await?;

    if hits.is_empty() {
        println!("No results.");
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, hit.src, hit.name);
        println!("    uri: {}", hit.uri);
        if !hit.description.is_empty() {
            println!("    {}", hit.description.replace('\n', " ").trim());
        }
        println!();
    }

    pool.close().await;
    Ok(())
}
