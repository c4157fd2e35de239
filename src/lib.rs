//! # helpsearch
//!
//! A small search service: ingest a paginated JSON corpus into SQLite FTS5
//! and answer free-text queries with ranked, deduplicated results.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │ Remote pages│──▶│ sanitize → dedup →   │──▶│  SQLite  │
//! │ 01.json ... │   │ chunked bulk insert  │   │  FTS5    │
//! └─────────────┘   └──────────────────────┘   └────┬─────┘
//!                                                   │
//!                      ┌────────────────────────────┤
//!                      ▼                            ▼
//!                 ┌──────────┐               ┌────────────┐
//!                 │   CLI    │               │    HTTP    │
//!                 │          │               │ /q /update │
//!                 └──────────┘               └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! helpsearch init                      # create database
//! helpsearch update --start 1          # rebuild from the remote corpus
//! helpsearch search "grep recursive"
//! helpsearch serve                     # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Build-run error type |
//! | [`sanitize`] | Field cleaning and length limits |
//! | [`fetch`] | Paginated corpus retrieval |
//! | [`dedup`] | Per-run `uri` deduplication |
//! | [`indexer`] | Chunked bulk insert and compaction |
//! | [`update`] | Build-run orchestration |
//! | [`progress`] | Progress reporting |
//! | [`query`] | Query string → FTS5 expressions |
//! | [`search`] | Two-phase ranked search |
//! | [`server`] | HTTP server |
//! | [`stats`] | Index statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod indexer;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod query;
pub mod sanitize;
pub mod search;
pub mod server;
pub mod stats;
pub mod update;
