use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Remote corpus location. Pages live at `<base_url>/{page:02}.json`.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_start")]
    pub default_start: u32,
    #[serde(default = "default_finish")]
    pub default_finish: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            default_start: default_start(),
            default_finish: default_finish(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_start() -> u32 {
    1
}
fn default_finish() -> u32 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_exact_limit")]
    pub exact_limit: i64,
    #[serde(default = "default_ranked_limit")]
    pub ranked_limit: i64,
    #[serde(default = "default_name_max_chars")]
    pub name_max_chars: usize,
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exact_limit: default_exact_limit(),
            ranked_limit: default_ranked_limit(),
            name_max_chars: default_name_max_chars(),
            description_max_chars: default_description_max_chars(),
        }
    }
}

fn default_exact_limit() -> i64 {
    5
}
fn default_ranked_limit() -> i64 {
    20
}
fn default_name_max_chars() -> usize {
    50
}
fn default_description_max_chars() -> usize {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub update_token: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://helpmanual.io".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.source.base_url.trim().is_empty() {
        anyhow::bail!("source.base_url must not be empty");
    }

    if config.index.chunk_size == 0 {
        anyhow::bail!("index.chunk_size must be > 0");
    }

    if config.search.ranked_limit < 1 {
        anyhow::bail!("search.ranked_limit must be >= 1");
    }
    if config.search.exact_limit < 0 {
        anyhow::bail!("search.exact_limit must be >= 0");
    }
    // room for the "..." suffix
    if config.search.description_max_chars < 3 {
        anyhow::bail!("search.description_max_chars must be >= 3");
    }

    if config.server.update_token.is_empty() {
        anyhow::bail!("server.update_token must not be empty");
    }

    Ok(())
}
