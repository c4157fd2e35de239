//! Core data models used throughout helpsearch.
//!
//! These types represent the records pulled from the remote corpus, the
//! entries stored in SQLite, and the hits returned by the query engine.

use serde::Serialize;

/// Raw document record as it appears in a corpus page.
///
/// Expected to be an object of string fields; anything else is malformed.
pub type RawRecord = serde_json::Value;

/// Sanitized entry ready to be loaded into the `entries` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub uri: String,
    pub name: String,
    pub src: String,
    pub description: String,
    pub keywords: String,
    pub body: String,
}

/// A single search result, in the order the query engine produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub uri: String,
    pub name: String,
    pub src: String,
    pub description: String,
}

/// Outcome of one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Number of pages fetched in the retrieval phase.
    pub pages: u32,
    /// Entries written to storage.
    pub loaded: u64,
    /// Records dropped because their `uri` was already seen this run.
    pub repeated: u64,
    /// Records dropped because a required field was missing.
    pub malformed: u64,
    pub entries_before: i64,
    pub entries_after: i64,
}
