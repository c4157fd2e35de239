//! # helpsearch CLI
//!
//! ## Usage
//!
//! ```bash
//! helpsearch --config ./config/helpsearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `helpsearch init` | Create the SQLite database and FTS5 schema |
//! | `helpsearch update` | Rebuild the index from the remote corpus |
//! | `helpsearch search "<query>"` | Search indexed entries |
//! | `helpsearch clear` | Delete every entry |
//! | `helpsearch stats` | Show entry counts |
//! | `helpsearch serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use helpsearch::{config, db, migrate, search, server, stats, update};

/// helpsearch: paginated corpus ingestion and ranked full-text search.
#[derive(Parser)]
#[command(name = "helpsearch", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/helpsearch.toml")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the `entries` table and its FTS5
    /// index. Running it more than once is safe.
    Init,

    /// Rebuild the index from the remote corpus.
    ///
    /// Probes pages `start..finish` for the end of the corpus, then replaces
    /// every entry in one transaction. Progress is written to stderr.
    Update {
        /// First page to load (defaults to `[index].default_start`).
        #[arg(long)]
        start: Option<u32>,

        /// Page bound, exclusive (defaults to `[index].default_finish`).
        #[arg(long)]
        finish: Option<u32>,
    },

    /// Search indexed entries.
    Search {
        /// The search query string.
        query: String,
    },

    /// Delete every entry from the index.
    Clear,

    /// Show index statistics.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Update { start, finish } => {
            let start = start.unwrap_or(cfg.index.default_start);
            let finish = finish.unwrap_or(cfg.index.default_finish);
            update::run_update_cmd(&cfg, start, finish).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
        Commands::Clear => {
            let pool = db::connect(&cfg).await?;
            let deleted = db::clear_entries(&pool).await?;
            pool.close().await;
            println!("deleted {} entries", deleted);
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
