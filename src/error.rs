//! Error types for the build pipeline.
//!
//! Only conditions that abort a build run live here. A missing page, a
//! malformed record, a repeated `uri` and a failed progress write are all
//! normal outcomes and are counted or logged instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("fetching {url} failed with status {status}")]
    SourceFetchFailed {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not reach {url}: {source}")]
    SourceUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode {url}: {source}")]
    SourceDecodeFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[from] sqlx::Error),

    #[error("an update is already running")]
    AlreadyRunning,
}
