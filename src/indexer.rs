//! Chunked bulk loading into the `entries` table.
//!
//! Entries are written with one multi-row `INSERT` per chunk on the caller's
//! connection, normally the build run's open transaction. Chunks only bound
//! statement size; atomicity comes from the enclosing transaction.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::Entry;

/// Largest chunk that keeps a 6-column insert under SQLite's bind limit.
pub const MAX_CHUNK_SIZE: usize = 5000;

pub struct BulkIndexer {
    chunk_size: usize,
}

impl BulkIndexer {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `entries` into the batches [`load`](Self::load) will insert.
    pub fn chunks<'a>(&self, entries: &'a [Entry]) -> std::slice::Chunks<'a, Entry> {
        entries.chunks(self.chunk_size)
    }

    /// Insert `entries` chunk by chunk. Returns the number of rows written.
    pub async fn load(
        &self,
        conn: &mut SqliteConnection,
        entries: &[Entry],
    ) -> Result<u64, sqlx::Error> {
        let mut rows = 0u64;
        for chunk in self.chunks(entries) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO entries (uri, name, src, description, keywords, body) ",
            );
            qb.push_values(chunk, |mut b, e| {
                b.push_bind(&e.uri)
                    .push_bind(&e.name)
                    .push_bind(&e.src)
                    .push_bind(&e.description)
                    .push_bind(&e.keywords)
                    .push_bind(&e.body);
            });
            rows += qb.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(rows)
    }

    /// Merge the FTS5 segments and reclaim free pages.
    ///
    /// Must run outside any transaction; `VACUUM` blocks until done.
    pub async fn compact(&self, pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO entries_fts(entries_fts) VALUES('optimize')")
            .execute(pool)
            .await?;
        sqlx::query("VACUUM").execute(pool).await?;
        Ok(())
    }
}
