//! Build-run orchestration.
//!
//! Coordinates one full index rebuild: probe the corpus, then inside a single
//! transaction delete the existing entries and load every page
//! (fetch → sanitize → dedup → chunked insert), commit, and compact.
//!
//! Any fetch or storage failure rolls the transaction back, so the previous
//! index stays in place. Concurrent searches read the last committed
//! snapshot (WAL) and never observe the delete.

use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::Config;
use crate::db;
use crate::dedup::Deduplicator;
use crate::error::BuildError;
use crate::fetch::CorpusFetcher;
use crate::indexer::BulkIndexer;
use crate::models::UpdateSummary;
use crate::progress::{ProgressReporter, StderrProgress};
use crate::sanitize::entry_from_record;

/// Single-flight guard for build runs and clears.
#[derive(Clone, Default)]
pub struct UpdateLock(Arc<Mutex<()>>);

impl UpdateLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock without waiting; fails if a run is already in progress.
    pub fn try_acquire(&self) -> Result<OwnedMutexGuard<()>, BuildError> {
        self.0
            .clone()
            .try_lock_owned()
            .map_err(|_| BuildError::AlreadyRunning)
    }
}

/// Run one build over pages `[start, finish)`.
///
/// Progress goes to `reporter` as the run advances. On failure the error is
/// logged and reported before the closing counts, then returned.
pub async fn run_update(
    pool: &SqlitePool,
    fetcher: &CorpusFetcher,
    indexer: &BulkIndexer,
    reporter: &dyn ProgressReporter,
    start: u32,
    finish: u32,
) -> Result<UpdateSummary, BuildError> {
    let started = Instant::now();
    let mut summary = UpdateSummary::default();

    let result = load_corpus(pool, fetcher, indexer, reporter, start, finish, &mut summary).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "error updating index");
        reporter.report(&format!("error updating index, {}", e));
    }

    match db::count_entries(pool).await {
        Ok(n) => summary.entries_after = n,
        Err(e) => tracing::warn!(error = %e, "could not count entries after update"),
    }
    reporter.report(&format!(
        "{} entries in search database after update, repeated entries {}, malformed entries {}",
        summary.entries_after, summary.repeated, summary.malformed
    ));
    reporter.report(&format!(
        "total time taken {:.2}s",
        started.elapsed().as_secs_f64()
    ));

    result.map(|()| summary)
}

async fn load_corpus(
    pool: &SqlitePool,
    fetcher: &CorpusFetcher,
    indexer: &BulkIndexer,
    reporter: &dyn ProgressReporter,
    start: u32,
    finish: u32,
    summary: &mut UpdateSummary,
) -> Result<(), BuildError> {
    summary.entries_before = db::count_entries(pool).await?;
    reporter.report(&format!(
        "{} entries in search database before update",
        summary.entries_before
    ));

    let mut cursor = fetcher.open(start, finish, reporter).await?;
    if cursor.finish() <= start {
        reporter.report("no pages to load, leaving index unchanged");
        return Ok(());
    }

    let mut dedup = Deduplicator::new();
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;

    while let Some(page) = cursor.next_page(reporter).await? {
        let page_started = Instant::now();
        let mut entries = Vec::with_capacity(page.records.len());
        for record in &page.records {
            let Some(entry) = entry_from_record(record) else {
                summary.malformed += 1;
                tracing::debug!(url = %page.url, "skipping malformed record");
                continue;
            };
            if dedup.admit(&entry.uri) {
                entries.push(entry);
            }
        }
        summary.repeated = dedup.repeated();

        let loaded = indexer.load(&mut tx, &entries).await?;
        summary.loaded += loaded;
        summary.pages += 1;
        reporter.report(&format!(
            "processed {} items in {:.2}s",
            loaded,
            page_started.elapsed().as_secs_f64()
        ));
    }

    tx.commit().await?;
    reporter.report("finished adding entries, running full vacuum...");
    indexer.compact(pool).await?;
    Ok(())
}

/// `helpsearch update`: rebuild from the command line with progress on stderr.
pub async fn run_update_cmd(config: &Config, start: u32, finish: u32) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let fetcher = CorpusFetcher::new(&config.source)?;
    let indexer = BulkIndexer::new(config.index.chunk_size);

    let result = run_update(&pool, &fetcher, &indexer, &StderrProgress, start, finish).await;
    pool.close().await;
    let summary = result?;

    println!("update {}..{}", start, finish);
    println!("  pages: {}", summary.pages);
    println!("  loaded: {}", summary.loaded);
    println!("  repeated: {}", summary.repeated);
    println!("  malformed: {}", summary.malformed);
    println!("  entries: {} -> {}", summary.entries_before, summary.entries_after);
    println!("ok");
    Ok(())
}
