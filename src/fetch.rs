//! Paginated corpus retrieval.
//!
//! The remote corpus is a numbered series of JSON pages,
//! `<base_url>/01.json`, `<base_url>/02.json`, ... Each page is an array of
//! document objects. The first page answering `404 Not Found` marks the end
//! of the corpus.
//!
//! Retrieval happens in two phases:
//!
//! 1. **Probe**: a `HEAD` request per page number from `start` upward finds
//!    the real end of the corpus without downloading bodies.
//! 2. **Retrieve**: [`PageCursor`] then yields the pages in `[start, finish)`
//!    one at a time, in increasing order.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::config::SourceConfig;
use crate::error::BuildError;
use crate::models::RawRecord;
use crate::progress::ProgressReporter;

/// Result of probing one page number.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageStatus {
    Exists,
    Missing,
}

/// One fetched page of the corpus.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: u32,
    pub url: String,
    pub records: Vec<RawRecord>,
}

pub struct CorpusFetcher {
    client: Client,
    base_url: String,
}

impl CorpusFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of page `page`, with the page number zero-padded to two digits.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}/{:02}.json", self.base_url, page)
    }

    /// Lightweight existence check for one page.
    ///
    /// Only `404` counts as missing. Any other status is left for the
    /// retrieval phase to judge.
    pub async fn probe(&self, page: u32) -> Result<PageStatus, BuildError> {
        let url = self.page_url(page);
        let resp = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|source| BuildError::SourceUnreachable { url: url.clone(), source })?;

        tracing::debug!(%url, status = %resp.status(), "probed page");
        if resp.status() == StatusCode::NOT_FOUND {
            Ok(PageStatus::Missing)
        } else {
            Ok(PageStatus::Exists)
        }
    }

    /// Narrow `finish` down to the first missing page in `[start, finish)`.
    ///
    /// Never probes at or beyond the original `finish`.
    pub async fn resolve_finish(&self, start: u32, finish: u32) -> Result<u32, BuildError> {
        for page in start..finish {
            if self.probe(page).await? == PageStatus::Missing {
                return Ok(page);
            }
        }
        Ok(finish)
    }

    /// Probe the corpus end, then return a cursor over the pages to load.
    pub async fn open(
        &self,
        start: u32,
        finish: u32,
        reporter: &dyn ProgressReporter,
    ) -> Result<PageCursor<'_>, BuildError> {
        reporter.report("counting files to process...");
        let finish = self.resolve_finish(start, finish).await?;
        reporter.report(&format!("getting files {} to {}", start, finish));
        Ok(PageCursor {
            fetcher: self,
            next: start,
            finish,
        })
    }

    /// Download and parse one page.
    ///
    /// Returns `Ok(None)` when the page is gone (`404`), which ends the corpus
    /// early. Every other non-success status is fatal.
    pub async fn fetch_page(&self, page: u32) -> Result<Option<Page>, BuildError> {
        let url = self.page_url(page);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BuildError::SourceUnreachable { url: url.clone(), source })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(%url, "page disappeared between probe and fetch");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BuildError::SourceFetchFailed { url, status });
        }

        let records: Vec<RawRecord> = resp
            .json()
            .await
            .map_err(|source| BuildError::SourceDecodeFailed { url: url.clone(), source })?;

        Ok(Some(Page {
            number: page,
            url,
            records,
        }))
    }
}

/// Lazy, in-order walk over the pages `[start, finish)`.
pub struct PageCursor<'a> {
    fetcher: &'a CorpusFetcher,
    next: u32,
    finish: u32,
}

impl PageCursor<'_> {
    /// Upper bound (exclusive) established by the probe phase.
    pub fn finish(&self) -> u32 {
        self.finish
    }

    /// Fetch the next page, or `None` once the range is exhausted.
    pub async fn next_page(
        &mut self,
        reporter: &dyn ProgressReporter,
    ) -> Result<Option<Page>, BuildError> {
        if self.next >= self.finish {
            return Ok(None);
        }
        let page = self.next;
        reporter.report(&format!("processing {}...", self.fetcher.page_url(page)));

        match self.fetcher.fetch_page(page).await? {
            Some(p) => {
                self.next += 1;
                Ok(Some(p))
            }
            None => {
                self.finish = page;
                Ok(None)
            }
        }
    }
}
